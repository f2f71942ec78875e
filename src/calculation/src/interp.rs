//! Linear interpolation over sampled curves.

use thiserror::Error;

/// Errors that can occur during interpolation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    #[error("Value {0} is out of bounds for interpolation range [{1}, {2}]")]
    OutOfBounds(f64, f64, f64),
    #[error("Input vectors must have at least 2 points")]
    InsufficientData,
    #[error("Input vectors must have the same length")]
    MismatchedLengths,
    #[error("X values must be sorted in ascending order")]
    UnsortedData,
}

/// Linear interpolation of `ys` over ascending `xs` at `x`.
///
/// Uses a binary search for the bracketing interval. An exact hit on a knot
/// returns that knot's value unchanged.
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> Result<f64, InterpError> {
    if xs.len() != ys.len() {
        return Err(InterpError::MismatchedLengths);
    }
    if xs.len() < 2 {
        return Err(InterpError::InsufficientData);
    }
    if xs.windows(2).any(|w| w[0] > w[1]) {
        return Err(InterpError::UnsortedData);
    }

    let first = xs[0];
    let last = xs[xs.len() - 1];
    if x < first || x > last || x.is_nan() {
        return Err(InterpError::OutOfBounds(x, first, last));
    }

    let idx = match xs.binary_search_by(|probe| probe.total_cmp(&x)) {
        Ok(exact) => return Ok(ys[exact]),
        Err(insert) => insert,
    };

    // x is strictly inside (xs[idx-1], xs[idx])
    let (x0, x1) = (xs[idx - 1], xs[idx]);
    let (y0, y1) = (ys[idx - 1], ys[idx]);
    if x1 == x0 {
        return Ok(y0);
    }
    let t = (x - x0) / (x1 - x0);
    Ok(y0 + t * (y1 - y0))
}

/// Like [`interp`], but clamps `x` into the sampled range first.
pub fn interp_clamped(x: f64, xs: &[f64], ys: &[f64]) -> Result<f64, InterpError> {
    if xs.is_empty() {
        return Err(InterpError::InsufficientData);
    }
    let x = x.clamp(xs[0], xs[xs.len() - 1]);
    interp(x, xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interp_midpoint() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 10.0, 30.0];
        assert_relative_eq!(interp(0.5, &xs, &ys).unwrap(), 5.0);
        assert_relative_eq!(interp(1.5, &xs, &ys).unwrap(), 20.0);
    }

    #[test]
    fn test_interp_exact_knot() {
        let xs = [-1.0, 0.0, 1.0];
        let ys = [3.0, 7.0, 9.0];
        assert_eq!(interp(0.0, &xs, &ys).unwrap(), 7.0);
        assert_eq!(interp(1.0, &xs, &ys).unwrap(), 9.0);
    }

    #[test]
    fn test_interp_errors() {
        assert_eq!(interp(0.0, &[0.0], &[1.0]), Err(InterpError::InsufficientData));
        assert_eq!(interp(0.0, &[0.0, 1.0], &[1.0]), Err(InterpError::MismatchedLengths));
        assert_eq!(interp(0.5, &[1.0, 0.0], &[1.0, 2.0]), Err(InterpError::UnsortedData));
        assert!(matches!(
            interp(5.0, &[0.0, 1.0], &[1.0, 2.0]),
            Err(InterpError::OutOfBounds(..))
        ));
    }

    #[test]
    fn test_interp_clamped() {
        let xs = [2.0, 4.0];
        let ys = [1.0, 3.0];
        assert_eq!(interp_clamped(-10.0, &xs, &ys).unwrap(), 1.0);
        assert_eq!(interp_clamped(10.0, &xs, &ys).unwrap(), 3.0);
    }
}
