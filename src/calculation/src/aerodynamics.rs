/// Aerodynamic models behind the analysis pipeline.
///
/// The pipeline never computes section or wing aerodynamics itself. It talks to
/// two external collaborators through traits:
///
/// - [`CoefficientPredictor`]: airfoil geometry + (alpha, Re) → 2D coefficients
/// - [`WingSolver`]: wing geometry + flight condition → 3D coefficients
///
/// [`ThinAirfoilModel`] and [`LiftingLineSolver`] are closed-form stand-ins for
/// the ML predictor and the vortex-lattice solver. They are cheap enough for
/// tests, benches and the demo binary and keep the right trends (camber shifts
/// the zero-lift angle, aspect ratio reduces the lift slope).

use std::f64::consts::PI;

use crate::error::{AnalysisError, Result, SolveFailure};
use crate::interp::{interp, InterpError};

/// Airfoil outline in Selig order: trailing edge over the upper surface to the
/// leading edge, then back along the lower surface.
#[derive(Debug, Clone, PartialEq)]
pub struct AirfoilGeometry {
    pub name: String,
    pub coordinates: Vec<(f64, f64)>,
}

/// Shape parameters read off an outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionProperties {
    /// Maximum thickness as a fraction of chord
    pub thickness: f64,
    /// Maximum mean-line offset as a fraction of chord (signed)
    pub camber: f64,
}

impl AirfoilGeometry {
    pub fn new(name: impl Into<String>, coordinates: Vec<(f64, f64)>) -> Self {
        Self {
            name: name.into(),
            coordinates,
        }
    }

    /// NACA 4-digit section ("2412", "0012", ...) with `points` stations per
    /// surface on cosine spacing. Returns `None` for malformed codes.
    pub fn naca4(code: &str, points: usize) -> Option<Self> {
        let digits: Vec<u32> = code.chars().map(|c| c.to_digit(10)).collect::<Option<_>>()?;
        if digits.len() != 4 || points < 3 {
            return None;
        }
        let m = digits[0] as f64 / 100.0;
        let p = digits[1] as f64 / 10.0;
        let t = (digits[2] * 10 + digits[3]) as f64 / 100.0;
        if t <= 0.0 {
            return None;
        }

        let stations: Vec<f64> = (0..points)
            .map(|i| 0.5 * (1.0 - (PI * i as f64 / (points - 1) as f64).cos()))
            .collect();

        let surface = |x: f64| -> (f64, f64) {
            let yt = 5.0
                * t
                * (0.2969 * x.sqrt() - 0.1260 * x - 0.3516 * x.powi(2) + 0.2843 * x.powi(3)
                    - 0.1015 * x.powi(4));
            let yc = if m == 0.0 || p == 0.0 {
                0.0
            } else if x < p {
                m / (p * p) * (2.0 * p * x - x * x)
            } else {
                m / ((1.0 - p) * (1.0 - p)) * ((1.0 - 2.0 * p) + 2.0 * p * x - x * x)
            };
            (yc + yt, yc - yt)
        };

        let mut coordinates = Vec::with_capacity(2 * points - 1);
        for &x in stations.iter().rev() {
            coordinates.push((x, surface(x).0));
        }
        for &x in stations.iter().skip(1) {
            coordinates.push((x, surface(x).1));
        }

        Some(Self::new(format!("naca{code}"), coordinates))
    }

    /// Splits the outline at the leading edge into (upper, lower), both with
    /// ascending x.
    fn surfaces(&self) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
        let le = self
            .coordinates
            .iter()
            .enumerate()
            .min_by(|a, b| a.1 .0.total_cmp(&b.1 .0))
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mut upper: Vec<(f64, f64)> = self.coordinates[..=le].to_vec();
        upper.reverse();
        let lower: Vec<(f64, f64)> = self.coordinates[le..].to_vec();
        (upper, lower)
    }

    /// Maximum thickness and camber, sampled at interior chord stations.
    pub fn section_properties(&self) -> std::result::Result<SectionProperties, InterpError> {
        if self.coordinates.len() < 3 {
            return Err(InterpError::InsufficientData);
        }
        let (upper, lower) = self.surfaces();
        let (xu, yu): (Vec<f64>, Vec<f64>) = upper.into_iter().unzip();
        let (xl, yl): (Vec<f64>, Vec<f64>) = lower.into_iter().unzip();

        let x_min = xu[0].max(xl[0]);
        let x_max = xu[xu.len() - 1].min(xl[xl.len() - 1]);

        let mut thickness: f64 = 0.0;
        let mut camber: f64 = 0.0;
        for i in 1..50 {
            let x = x_min + (x_max - x_min) * i as f64 / 50.0;
            let up = interp(x, &xu, &yu)?;
            let lo = interp(x, &xl, &yl)?;
            thickness = thickness.max(up - lo);
            let mean = 0.5 * (up + lo);
            if mean.abs() > camber.abs() {
                camber = mean;
            }
        }

        Ok(SectionProperties { thickness, camber })
    }
}

/// 2D section coefficients at one (alpha, Re) point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionCoefficients {
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

/// Black-box airfoil coefficient predictor (the ML model in production).
pub trait CoefficientPredictor {
    /// Predict coefficients for `geometry` at `alpha_deg` and `reynolds`.
    fn predict(
        &self,
        geometry: &AirfoilGeometry,
        alpha_deg: f64,
        reynolds: f64,
    ) -> Result<SectionCoefficients>;
}

/// Rectangular wing handed to a [`WingSolver`].
#[derive(Debug, Clone, Copy)]
pub struct WingGeometry<'a> {
    pub span: f64,
    pub chord: f64,
    pub section: &'a AirfoilGeometry,
}

impl WingGeometry<'_> {
    pub fn area(&self) -> f64 {
        self.span * self.chord
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.span / self.chord
    }
}

/// Operating point for a 3D solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightCondition {
    pub velocity: f64,
    pub alpha_deg: f64,
}

/// 3D wing coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WingCoefficients {
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

/// Black-box 3D wing solver (the vortex-lattice code in production).
pub trait WingSolver {
    fn solve(
        &self,
        wing: &WingGeometry<'_>,
        condition: &FlightCondition,
    ) -> std::result::Result<WingCoefficients, SolveFailure>;
}

/// Section lift slope with a viscous knock-down (per radian).
const SECTION_LIFT_SLOPE: f64 = 2.0 * PI * 0.9;

/// Closed-form section model: thin-airfoil lift with a camber-driven zero-lift
/// angle, a Reynolds-dependent stall cap and a parabolic drag polar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThinAirfoilModel {
    /// Post-stall lift loss (per deg²)
    pub stall_softness: f64,
    /// Drag polar curvature
    pub induced_factor: f64,
}

impl Default for ThinAirfoilModel {
    fn default() -> Self {
        Self {
            stall_softness: 0.02,
            induced_factor: 0.01,
        }
    }
}

impl ThinAirfoilModel {
    /// Zero-lift angle (deg) for a given camber.
    pub fn zero_lift_angle_deg(camber: f64) -> f64 {
        -105.0 * camber
    }

    /// Stall lift coefficient for a section at a Reynolds number.
    pub fn cl_max(props: &SectionProperties, reynolds: f64) -> f64 {
        let base = 0.9 + 12.0 * props.camber + 2.0 * (props.thickness - 0.06);
        base.max(0.6) * (reynolds / 1.0e6).powf(0.1)
    }

    fn evaluate(&self, props: &SectionProperties, alpha_deg: f64, reynolds: f64) -> SectionCoefficients {
        let slope_deg = SECTION_LIFT_SLOPE.to_radians();
        let alpha0 = Self::zero_lift_angle_deg(props.camber);
        let cl_max = Self::cl_max(props, reynolds);
        let alpha_stall = alpha0 + cl_max / slope_deg;

        let linear = slope_deg * (alpha_deg - alpha0);
        let cl = if alpha_deg <= alpha_stall {
            linear.max(-0.8 * cl_max)
        } else {
            let past = alpha_deg - alpha_stall;
            (cl_max - self.stall_softness * past * past).max(0.6 * cl_max)
        };

        let cd0 = 0.0065 * (reynolds / 1.0e6).powf(-0.25) * (1.0 + 2.0 * props.thickness);
        let design_cl = 10.0 * props.camber;
        let mut cd = cd0 + self.induced_factor * (cl - design_cl).powi(2);
        if alpha_deg > alpha_stall {
            cd += 0.03 * (alpha_deg - alpha_stall);
        }

        SectionCoefficients {
            cl,
            cd,
            cm: -2.5 * props.camber,
        }
    }
}

impl CoefficientPredictor for ThinAirfoilModel {
    fn predict(
        &self,
        geometry: &AirfoilGeometry,
        alpha_deg: f64,
        reynolds: f64,
    ) -> Result<SectionCoefficients> {
        if !(reynolds > 0.0) || !alpha_deg.is_finite() {
            return Err(AnalysisError::Predictor {
                airfoil: geometry.name.clone(),
                reason: format!("unsupported condition alpha={alpha_deg} Re={reynolds}"),
            });
        }
        let props = geometry
            .section_properties()
            .map_err(|e| AnalysisError::Predictor {
                airfoil: geometry.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(self.evaluate(&props, alpha_deg, reynolds))
    }
}

/// Prandtl lifting-line estimate for a straight rectangular wing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiftingLineSolver {
    /// Span efficiency factor
    pub span_efficiency: f64,
    /// Profile drag added to the induced drag
    pub profile_drag: f64,
}

impl Default for LiftingLineSolver {
    fn default() -> Self {
        Self {
            span_efficiency: 0.9,
            profile_drag: 0.01,
        }
    }
}

impl WingSolver for LiftingLineSolver {
    fn solve(
        &self,
        wing: &WingGeometry<'_>,
        condition: &FlightCondition,
    ) -> std::result::Result<WingCoefficients, SolveFailure> {
        if !(wing.span > 0.0) || !(wing.chord > 0.0) {
            return Err(SolveFailure::Solver(format!(
                "degenerate wing span={} chord={}",
                wing.span, wing.chord
            )));
        }
        let props = wing
            .section
            .section_properties()
            .map_err(|e| SolveFailure::Solver(e.to_string()))?;

        let ar = wing.aspect_ratio();
        let k = PI * self.span_efficiency * ar;
        let slope = SECTION_LIFT_SLOPE / (1.0 + SECTION_LIFT_SLOPE / k);
        let alpha0 = ThinAirfoilModel::zero_lift_angle_deg(props.camber);

        let cl = slope * (condition.alpha_deg - alpha0).to_radians();
        let cd = self.profile_drag + cl * cl / k;

        Ok(WingCoefficients {
            cl,
            cd,
            cm: -2.5 * props.camber,
        })
    }
}

/// Lift force L = ½ρV²·S·CL (N).
#[inline(always)]
pub fn lift_force(cl: f64, rho: f64, velocity: f64, area: f64) -> f64 {
    0.5 * rho * velocity * velocity * area * cl
}

/// Chord that yields `reynolds` at `velocity`.
pub fn chord_for_reynolds(reynolds: f64, velocity: f64, kinematic_viscosity: f64) -> f64 {
    reynolds * kinematic_viscosity / velocity
}
