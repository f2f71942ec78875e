/// Angle-of-attack × Reynolds-number sweeps through a coefficient predictor.
///
/// The sweep is the only place the pipeline calls the external predictor. Each
/// airfoil is swept independently; a predictor failure drops that airfoil and
/// is recorded in the batch report.

use log::{info, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::aerodynamics::{AirfoilGeometry, CoefficientPredictor};
use crate::constants::defaults;
use crate::error::{AnalysisError, BatchOutcome, BatchReport, Result};

/// One (airfoil, alpha, Re) point with its predicted coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct AirfoilCoefficientSample {
    pub airfoil: String,
    pub alpha_deg: f64,
    pub reynolds: f64,
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

/// All samples produced for one airfoil.
#[derive(Debug, Clone, PartialEq)]
pub struct AirfoilSweep {
    pub airfoil: String,
    pub samples: Vec<AirfoilCoefficientSample>,
}

/// Bounds of the rectangular sweep grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub alpha_min_deg: f64,
    pub alpha_max_deg: f64,
    pub alpha_step_deg: f64,
    pub re_min: f64,
    pub re_max: f64,
    pub re_points: usize,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            alpha_min_deg: defaults::ALPHA_MIN_DEG,
            alpha_max_deg: defaults::ALPHA_MAX_DEG,
            alpha_step_deg: defaults::ALPHA_STEP_DEG,
            re_min: defaults::RE_MIN,
            re_max: defaults::RE_MAX,
            re_points: defaults::RE_POINTS,
        }
    }
}

impl SweepSettings {
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.alpha_min_deg,
            self.alpha_max_deg,
            self.alpha_step_deg,
            self.re_min,
            self.re_max,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(AnalysisError::Config("sweep bounds must be finite".into()));
        }
        if self.alpha_min_deg >= self.alpha_max_deg {
            return Err(AnalysisError::Config(format!(
                "angle sweep [{}, {}] is empty",
                self.alpha_min_deg, self.alpha_max_deg
            )));
        }
        if self.alpha_step_deg <= 0.0 {
            return Err(AnalysisError::Config("angle step must be positive".into()));
        }
        if self.re_min <= 0.0 || self.re_max < self.re_min {
            return Err(AnalysisError::Config(format!(
                "Reynolds sweep [{}, {}] is invalid",
                self.re_min, self.re_max
            )));
        }
        if self.re_points == 0 {
            return Err(AnalysisError::Config("at least one Reynolds point is required".into()));
        }
        Ok(())
    }

    /// Inclusive linear angle grid.
    pub fn alphas(&self) -> Array1<f64> {
        let span = self.alpha_max_deg - self.alpha_min_deg;
        let n = (span / self.alpha_step_deg).round() as usize + 1;
        Array1::linspace(self.alpha_min_deg, self.alpha_max_deg, n.max(2))
    }

    /// Geometrically spaced Reynolds numbers from `re_min` to `re_max`.
    pub fn reynolds(&self) -> Array1<f64> {
        if self.re_points <= 1 {
            return Array1::from_elem(1, self.re_min);
        }
        let ratio = self.re_max / self.re_min;
        let last = (self.re_points - 1) as f64;
        Array1::from_iter(
            (0..self.re_points).map(|i| self.re_min * ratio.powf(i as f64 / last)),
        )
    }
}

/// Evaluate the predictor on the full grid for one airfoil.
///
/// Samples come back Reynolds-major with ascending angle.
pub fn sweep_airfoil<P: CoefficientPredictor + ?Sized>(
    predictor: &P,
    geometry: &AirfoilGeometry,
    settings: &SweepSettings,
) -> Result<AirfoilSweep> {
    let alphas = settings.alphas();
    let reynolds = settings.reynolds();
    let mut samples = Vec::with_capacity(alphas.len() * reynolds.len());

    for &re in reynolds.iter() {
        for &alpha in alphas.iter() {
            let c = predictor.predict(geometry, alpha, re)?;
            samples.push(AirfoilCoefficientSample {
                airfoil: geometry.name.clone(),
                alpha_deg: alpha,
                reynolds: re,
                cl: c.cl,
                cd: c.cd,
                cm: c.cm,
            });
        }
    }

    Ok(AirfoilSweep {
        airfoil: geometry.name.clone(),
        samples,
    })
}

/// Sweep every airfoil, skipping (and reporting) the ones the predictor rejects.
pub fn sweep_airfoils<P: CoefficientPredictor + ?Sized>(
    predictor: &P,
    geometries: &[AirfoilGeometry],
    settings: &SweepSettings,
) -> BatchOutcome<AirfoilSweep> {
    let mut report = BatchReport::default();
    let mut items = Vec::with_capacity(geometries.len());

    for geometry in geometries {
        match sweep_airfoil(predictor, geometry, settings) {
            Ok(sweep) => {
                report.record_success();
                items.push(sweep);
            }
            Err(err) => {
                warn!("Skipping {}: {}", geometry.name, err);
                report.record_failure(geometry.name.clone(), err);
            }
        }
    }

    info!("Coefficient sweep: {}", report);
    BatchOutcome { items, report }
}
