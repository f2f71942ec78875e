/// Feature extraction from raw coefficient sweeps.
///
/// Collapses the (alpha, Re) grid of one airfoil into one
/// [`AirfoilFeatureRecord`] per Reynolds number: stall point, best
/// lift-to-drag point, zero-incidence performance and the stall margin
/// `angle_diff`.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use ndarray::Array1;

use crate::constants::defaults;
use crate::error::{AnalysisError, BatchOutcome, BatchReport, Result};
use crate::interp::interp_clamped;
use crate::sweep::{AirfoilCoefficientSample, AirfoilSweep};

/// Angles closer to zero than this count as an exact 0° sample.
const ZERO_ALPHA_TOLERANCE: f64 = 1e-9;

/// Summary features of one airfoil at one Reynolds number.
#[derive(Debug, Clone, PartialEq)]
pub struct AirfoilFeatureRecord {
    pub airfoil: String,
    pub reynolds: f64,
    /// Maximum lift coefficient over the sweep
    pub cl_max: f64,
    pub stall_angle_deg: f64,
    /// False when lift was still rising (or only falling) across the whole
    /// sweep, in which case `cl_max` is the largest observed value.
    pub stall_captured: bool,
    pub max_lift_to_drag: f64,
    pub optimum_angle_deg: f64,
    pub optimum_cl: f64,
    pub optimum_cd: f64,
    pub cl_at_zero: f64,
    pub cd_at_zero: f64,
    /// stall angle − optimum-L/D angle (deg)
    pub angle_diff: f64,
    /// First zero crossing of the lift curve, if the sweep contains one.
    pub zero_lift_angle_deg: Option<f64>,
}

impl AirfoilFeatureRecord {
    /// Identifier used in reports and tie-breaks.
    pub fn id(&self) -> String {
        format!("{}@Re{:.0}", self.airfoil, self.reynolds)
    }
}

/// Knobs of the extraction step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSettings {
    /// Restricts the best-L/D search to this angle window (deg). `None`
    /// searches the whole sweep.
    pub operating_alpha_deg: Option<(f64, f64)>,
    pub min_angle_samples: usize,
}

impl FeatureSettings {
    /// Distinct angles needed per Reynolds number, never fewer than three.
    pub fn required_angles(&self) -> usize {
        self.min_angle_samples.max(defaults::MIN_ANGLE_SAMPLES)
    }
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            operating_alpha_deg: None,
            min_angle_samples: defaults::MIN_ANGLE_SAMPLES,
        }
    }
}

/// Lift/drag curve of one airfoil at one Reynolds number, sorted by angle.
struct PolarCurve {
    alpha: Array1<f64>,
    cl: Array1<f64>,
    cd: Array1<f64>,
}

impl PolarCurve {
    fn from_samples(mut samples: Vec<&AirfoilCoefficientSample>) -> Self {
        samples.sort_by(|a, b| a.alpha_deg.total_cmp(&b.alpha_deg));
        Self {
            alpha: samples.iter().map(|s| s.alpha_deg).collect(),
            cl: samples.iter().map(|s| s.cl).collect(),
            cd: samples.iter().map(|s| s.cd).collect(),
        }
    }

    fn len(&self) -> usize {
        self.alpha.len()
    }

    /// Number of different angles; `alpha` is sorted.
    fn distinct_angles(&self) -> usize {
        if self.alpha.is_empty() {
            return 0;
        }
        1 + (1..self.len())
            .filter(|&i| self.alpha[i] != self.alpha[i - 1])
            .count()
    }

    /// Index of the first maximum of `values` among `candidates`.
    fn argmax(values: &Array1<f64>, candidates: impl Iterator<Item = usize>) -> Option<usize> {
        let mut best: Option<usize> = None;
        for i in candidates {
            match best {
                Some(b) if values[i] <= values[b] => {}
                _ => best = Some(i),
            }
        }
        best
    }

    fn value_at_zero(&self, values: &Array1<f64>) -> f64 {
        let alpha = self.alpha.as_slice().unwrap_or(&[]);
        if let Some(i) = alpha.iter().position(|a| a.abs() < ZERO_ALPHA_TOLERANCE) {
            return values[i];
        }
        let ys = values.to_vec();
        // len >= min_angle_samples, so interpolation inputs are valid
        interp_clamped(0.0, alpha, &ys).unwrap_or(values[0])
    }

    fn zero_lift_angle(&self) -> Option<f64> {
        (0..self.len().saturating_sub(1)).find_map(|i| {
            let (c0, c1) = (self.cl[i], self.cl[i + 1]);
            if c0 == 0.0 {
                Some(self.alpha[i])
            } else if c0 * c1 < 0.0 {
                let t = -c0 / (c1 - c0);
                Some(self.alpha[i] + t * (self.alpha[i + 1] - self.alpha[i]))
            } else {
                None
            }
        })
    }
}

fn check_sample(airfoil: &str, s: &AirfoilCoefficientSample) -> Result<()> {
    let invalid = |reason: String| AnalysisError::InvalidSample {
        airfoil: airfoil.to_string(),
        alpha_deg: s.alpha_deg,
        reynolds: s.reynolds,
        reason,
    };

    if s.airfoil != airfoil {
        return Err(invalid(format!("sample belongs to {}", s.airfoil)));
    }
    if !(s.alpha_deg.is_finite() && s.cl.is_finite() && s.cd.is_finite() && s.cm.is_finite()) {
        return Err(invalid("non-finite value".into()));
    }
    if !(s.reynolds.is_finite() && s.reynolds > 0.0) {
        return Err(invalid("Reynolds number must be positive".into()));
    }
    if s.cd <= 0.0 {
        return Err(invalid(format!("drag coefficient {} is not positive", s.cd)));
    }
    Ok(())
}

fn extract_at_reynolds(
    airfoil: &str,
    reynolds: f64,
    samples: Vec<&AirfoilCoefficientSample>,
    settings: &FeatureSettings,
) -> Result<AirfoilFeatureRecord> {
    let curve = PolarCurve::from_samples(samples);
    let required = settings.required_angles();
    let distinct = curve.distinct_angles();
    if distinct < required {
        return Err(AnalysisError::EmptySampleSet {
            airfoil: airfoil.to_string(),
            reynolds,
            found: distinct,
            required,
        });
    }
    let n = curve.len();
    if distinct < n {
        let repeated = (1..n)
            .find(|&i| curve.alpha[i] == curve.alpha[i - 1])
            .map(|i| curve.alpha[i])
            .unwrap_or(curve.alpha[0]);
        return Err(AnalysisError::InvalidSample {
            airfoil: airfoil.to_string(),
            alpha_deg: repeated,
            reynolds,
            reason: "duplicate angle of attack".into(),
        });
    }

    let stall = PolarCurve::argmax(&curve.cl, 0..n).unwrap_or(0);
    let stall_captured = stall > 0 && stall < n - 1;
    if !stall_captured {
        warn!(
            "{} at Re={:.0}: stall not reached within [{}°, {}°], using max observed CL",
            airfoil,
            reynolds,
            curve.alpha[0],
            curve.alpha[n - 1]
        );
    }

    let lift_to_drag = &curve.cl / &curve.cd;
    let window: Vec<usize> = match settings.operating_alpha_deg {
        Some((lo, hi)) => (0..n)
            .filter(|&i| curve.alpha[i] >= lo && curve.alpha[i] <= hi)
            .collect(),
        None => (0..n).collect(),
    };
    let optimum = PolarCurve::argmax(&lift_to_drag, window.into_iter()).ok_or_else(|| {
        AnalysisError::EmptySampleSet {
            airfoil: airfoil.to_string(),
            reynolds,
            found: 0,
            required: 1,
        }
    })?;

    let record = AirfoilFeatureRecord {
        airfoil: airfoil.to_string(),
        reynolds,
        cl_max: curve.cl[stall],
        stall_angle_deg: curve.alpha[stall],
        stall_captured,
        max_lift_to_drag: lift_to_drag[optimum],
        optimum_angle_deg: curve.alpha[optimum],
        optimum_cl: curve.cl[optimum],
        optimum_cd: curve.cd[optimum],
        cl_at_zero: curve.value_at_zero(&curve.cl),
        cd_at_zero: curve.value_at_zero(&curve.cd),
        angle_diff: curve.alpha[stall] - curve.alpha[optimum],
        zero_lift_angle_deg: curve.zero_lift_angle(),
    };
    debug!(
        "{}: CLmax={:.3} @ {:.1}°, L/D={:.1} @ {:.1}°",
        record.id(),
        record.cl_max,
        record.stall_angle_deg,
        record.max_lift_to_drag,
        record.optimum_angle_deg
    );
    Ok(record)
}

/// Extract one feature record per Reynolds number from an airfoil's samples.
///
/// Records are returned in ascending Reynolds order. Any non-physical sample
/// fails the whole airfoil.
pub fn extract_features(
    airfoil: &str,
    samples: &[AirfoilCoefficientSample],
    settings: &FeatureSettings,
) -> Result<Vec<AirfoilFeatureRecord>> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptySampleSet {
            airfoil: airfoil.to_string(),
            reynolds: 0.0,
            found: 0,
            required: settings.required_angles(),
        });
    }

    // positive finite f64 bit patterns sort like the values
    let mut by_reynolds: BTreeMap<u64, Vec<&AirfoilCoefficientSample>> = BTreeMap::new();
    for sample in samples {
        check_sample(airfoil, sample)?;
        by_reynolds
            .entry(sample.reynolds.to_bits())
            .or_default()
            .push(sample);
    }

    by_reynolds
        .into_iter()
        .map(|(bits, group)| extract_at_reynolds(airfoil, f64::from_bits(bits), group, settings))
        .collect()
}

/// Extract features for many airfoils. A failing airfoil is logged, counted
/// and skipped.
pub fn extract_feature_batch(
    sweeps: &[AirfoilSweep],
    settings: &FeatureSettings,
) -> BatchOutcome<AirfoilFeatureRecord> {
    let mut report = BatchReport::default();
    let mut items = Vec::new();

    for sweep in sweeps {
        match extract_features(&sweep.airfoil, &sweep.samples, settings) {
            Ok(records) => {
                report.record_success();
                items.extend(records);
            }
            Err(err) => {
                warn!("Feature extraction failed for {}: {}", sweep.airfoil, err);
                report.record_failure(sweep.airfoil.clone(), err);
            }
        }
    }

    info!("Feature extraction: {} ({} records)", report, items.len());
    BatchOutcome { items, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(alpha: f64, re: f64, cl: f64, cd: f64) -> AirfoilCoefficientSample {
        AirfoilCoefficientSample {
            airfoil: "test".to_string(),
            alpha_deg: alpha,
            reynolds: re,
            cl,
            cd,
            cm: -0.05,
        }
    }

    /// Lift peaks at 10°, drag bucket around 2°.
    fn polar(re: f64, alphas: &[f64]) -> Vec<AirfoilCoefficientSample> {
        alphas
            .iter()
            .map(|&a| {
                let cl = if a <= 10.0 { 0.2 + 0.1 * a } else { 1.2 - 0.05 * (a - 10.0) };
                let cd = 0.01 + 0.002 * (a - 2.0).powi(2) / 4.0;
                sample(a, re, cl, cd)
            })
            .collect()
    }

    fn grid() -> Vec<f64> {
        (-5..=15).map(|a| a as f64).collect()
    }

    #[test]
    fn test_extract_basic_features() {
        let samples = polar(2.0e5, &grid());
        let records = extract_features("test", &samples, &FeatureSettings::default()).unwrap();
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.reynolds, 2.0e5);
        assert_relative_eq!(r.cl_max, 1.2, epsilon = 1e-12);
        assert_eq!(r.stall_angle_deg, 10.0);
        assert!(r.stall_captured);
        assert_relative_eq!(r.cl_at_zero, 0.2, epsilon = 1e-12);
        assert_relative_eq!(r.cd_at_zero, 0.01 + 0.002, epsilon = 1e-12);
        assert_relative_eq!(r.angle_diff, r.stall_angle_deg - r.optimum_angle_deg);
        assert_relative_eq!(r.max_lift_to_drag, r.optimum_cl / r.optimum_cd, epsilon = 1e-12);
        assert_relative_eq!(r.zero_lift_angle_deg.unwrap(), -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_optimum_is_global_max_lift_to_drag() {
        let samples = polar(2.0e5, &grid());
        let r = &extract_features("test", &samples, &FeatureSettings::default()).unwrap()[0];
        let best = samples
            .iter()
            .map(|s| s.cl / s.cd)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(r.max_lift_to_drag, best);
    }

    #[test]
    fn test_operating_window_restricts_optimum() {
        let samples = polar(2.0e5, &grid());
        let settings = FeatureSettings {
            operating_alpha_deg: Some((0.0, 1.0)),
            ..FeatureSettings::default()
        };
        let r = &extract_features("test", &samples, &settings).unwrap()[0];
        assert!(r.optimum_angle_deg >= 0.0 && r.optimum_angle_deg <= 1.0);
    }

    #[test]
    fn test_empty_operating_window_fails() {
        let samples = polar(2.0e5, &grid());
        let settings = FeatureSettings {
            operating_alpha_deg: Some((30.0, 40.0)),
            ..FeatureSettings::default()
        };
        assert!(matches!(
            extract_features("test", &samples, &settings),
            Err(AnalysisError::EmptySampleSet { found: 0, .. })
        ));
    }

    #[test]
    fn test_zero_alpha_is_interpolated() {
        let alphas: Vec<f64> = (0..10).map(|i| -4.5 + i as f64).collect(); // ..., -0.5, 0.5, ...
        let samples = polar(2.0e5, &alphas);
        let r = &extract_features("test", &samples, &FeatureSettings::default()).unwrap()[0];
        // cl is linear there: 0.2 + 0.1 * 0
        assert_relative_eq!(r.cl_at_zero, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_stall_not_captured_is_flagged() {
        let alphas: Vec<f64> = (-5..=8).map(|a| a as f64).collect();
        let samples = polar(2.0e5, &alphas);
        let r = &extract_features("test", &samples, &FeatureSettings::default()).unwrap()[0];
        assert!(!r.stall_captured);
        assert_eq!(r.stall_angle_deg, 8.0);
        assert_relative_eq!(r.cl_max, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_one_record_per_reynolds_in_order() {
        let mut samples = polar(3.0e5, &grid());
        samples.extend(polar(1.5e5, &grid()));
        let records = extract_features("test", &samples, &FeatureSettings::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reynolds, 1.5e5);
        assert_eq!(records[1].reynolds, 3.0e5);
    }

    #[test]
    fn test_unordered_samples_are_sorted() {
        let mut samples = polar(2.0e5, &grid());
        samples.reverse();
        let r = &extract_features("test", &samples, &FeatureSettings::default()).unwrap()[0];
        assert_eq!(r.stall_angle_deg, 10.0);
    }

    #[test]
    fn test_too_few_samples() {
        let samples = polar(2.0e5, &[0.0, 1.0]);
        match extract_features("test", &samples, &FeatureSettings::default()) {
            Err(AnalysisError::EmptySampleSet { found, required, .. }) => {
                assert_eq!(found, 2);
                assert_eq!(required, 3);
            }
            other => panic!("expected EmptySampleSet, got {other:?}"),
        }
        assert!(matches!(
            extract_features("test", &[], &FeatureSettings::default()),
            Err(AnalysisError::EmptySampleSet { found: 0, .. })
        ));
    }

    #[test]
    fn test_minimum_angle_count_cannot_be_lowered() {
        let settings = FeatureSettings {
            min_angle_samples: 0,
            ..FeatureSettings::default()
        };
        assert_eq!(settings.required_angles(), 3);

        let samples = polar(2.0e5, &[0.0, 5.0]);
        assert!(matches!(
            extract_features("test", &samples, &settings),
            Err(AnalysisError::EmptySampleSet { found: 2, required: 3, .. })
        ));
    }

    #[test]
    fn test_repeated_angle_does_not_count_twice() {
        let samples = polar(2.0e5, &[2.0, 2.0, 2.0]);
        assert!(matches!(
            extract_features("test", &samples, &FeatureSettings::default()),
            Err(AnalysisError::EmptySampleSet { found: 1, required: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_angle_is_rejected() {
        let samples = polar(2.0e5, &[-1.0, 0.0, 1.0, 1.0, 2.0]);
        match extract_features("test", &samples, &FeatureSettings::default()) {
            Err(AnalysisError::InvalidSample { alpha_deg, .. }) => assert_eq!(alpha_deg, 1.0),
            other => panic!("expected InvalidSample, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_drag_is_rejected() {
        let mut samples = polar(2.0e5, &grid());
        samples[4].cd = 0.0;
        assert!(matches!(
            extract_features("test", &samples, &FeatureSettings::default()),
            Err(AnalysisError::InvalidSample { .. })
        ));

        samples[4].cd = -0.01;
        assert!(extract_features("test", &samples, &FeatureSettings::default()).is_err());
    }

    #[test]
    fn test_nan_sample_is_rejected() {
        let mut samples = polar(2.0e5, &grid());
        samples[2].cl = f64::NAN;
        assert!(matches!(
            extract_features("test", &samples, &FeatureSettings::default()),
            Err(AnalysisError::InvalidSample { .. })
        ));
    }

    #[test]
    fn test_batch_skips_bad_airfoil() {
        let good = AirfoilSweep {
            airfoil: "test".to_string(),
            samples: polar(2.0e5, &grid()),
        };
        let mut bad_samples = polar(2.0e5, &grid());
        for s in bad_samples.iter_mut() {
            s.airfoil = "broken".to_string();
        }
        bad_samples[0].cd = -1.0;
        let bad = AirfoilSweep {
            airfoil: "broken".to_string(),
            samples: bad_samples,
        };

        let outcome = extract_feature_batch(&[good, bad], &FeatureSettings::default());
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.report.succeeded, 1);
        assert_eq!(outcome.report.failed_ids(), vec!["broken"]);
    }
}
