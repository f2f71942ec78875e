/// Candidate wing geometries.
///
/// For every (airfoil, aspect ratio) pair one rectangular wing is sized from
/// the constraint that is held fixed, then discarded early if it breaks the
/// span limit. What survives is handed to the solver in the `Unsolved` state.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::aerodynamics::chord_for_reynolds;
use crate::error::{AnalysisError, Result, SolveFailure};
use crate::features::AirfoilFeatureRecord;
use crate::scoring::RankedAirfoilRecord;

/// Which quantity stays fixed while the aspect ratio varies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WingSizing {
    /// Span fixed: chord = span / AR
    FixedSpan { span_m: f64 },
    /// Planform area fixed: span = √(AR·S), chord = span / AR
    FixedArea { area_m2: f64 },
    /// Chord chosen so the wing flies at the record's Reynolds number:
    /// chord = Re·ν / V, span = AR·chord
    FromReynolds,
}

impl Default for WingSizing {
    fn default() -> Self {
        WingSizing::FromReynolds
    }
}

/// Geometric constraints for one generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WingConstraints {
    pub max_wingspan_m: f64,
    pub sizing: WingSizing,
    /// Design airspeed, used by [`WingSizing::FromReynolds`]
    pub velocity_ms: f64,
    pub kinematic_viscosity: f64,
}

impl WingConstraints {
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.max_wingspan_m) {
            return Err(AnalysisError::Config(format!(
                "maximum wingspan {} must be positive",
                self.max_wingspan_m
            )));
        }
        match self.sizing {
            WingSizing::FixedSpan { span_m } if !positive(span_m) => Err(AnalysisError::Config(
                format!("fixed span {span_m} must be positive"),
            )),
            WingSizing::FixedArea { area_m2 } if !positive(area_m2) => Err(AnalysisError::Config(
                format!("fixed area {area_m2} must be positive"),
            )),
            WingSizing::FromReynolds
                if !positive(self.velocity_ms) || !positive(self.kinematic_viscosity) =>
            {
                Err(AnalysisError::Config(
                    "Reynolds sizing needs positive velocity and viscosity".into(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// (span, chord) for one aspect ratio, before the span limit is applied.
    pub fn size(&self, aspect_ratio: f64, reynolds: f64) -> (f64, f64) {
        match self.sizing {
            WingSizing::FixedSpan { span_m } => (span_m, span_m / aspect_ratio),
            WingSizing::FixedArea { area_m2 } => {
                let span = (aspect_ratio * area_m2).sqrt();
                (span, span / aspect_ratio)
            }
            WingSizing::FromReynolds => {
                let chord = chord_for_reynolds(reynolds, self.velocity_ms, self.kinematic_viscosity);
                (aspect_ratio * chord, chord)
            }
        }
    }
}

/// 3D result for a solved wing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WingSolution {
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
    /// Lift at the design condition (N)
    pub lift_force_n: f64,
}

/// Lifecycle of a candidate wing.
#[derive(Debug, Clone, PartialEq)]
pub enum WingState {
    /// Geometry only
    Unsolved,
    Solved(WingSolution),
    /// Solved, but below the required lift
    Infeasible(WingSolution),
    SolveFailed(SolveFailure),
}

impl WingState {
    pub fn label(&self) -> &'static str {
        match self {
            WingState::Unsolved => "unsolved",
            WingState::Solved(_) => "solved",
            WingState::Infeasible(_) => "infeasible",
            WingState::SolveFailed(_) => "solve-failed",
        }
    }

    pub fn solution(&self) -> Option<&WingSolution> {
        match self {
            WingState::Solved(s) | WingState::Infeasible(s) => Some(s),
            _ => None,
        }
    }
}

/// One candidate rectangular wing.
#[derive(Debug, Clone, PartialEq)]
pub struct WingConfiguration {
    pub airfoil: String,
    /// Reynolds number of the source feature record
    pub reynolds: f64,
    /// Mission score of the source airfoil
    pub score: f64,
    pub aspect_ratio: f64,
    pub span_m: f64,
    pub chord_m: f64,
    /// Angle the wing is solved at (the section's best-L/D angle)
    pub operating_alpha_deg: f64,
    /// The section lifts at the operating angle, so the wing must too.
    pub expects_positive_lift: bool,
    pub state: WingState,
}

impl WingConfiguration {
    pub fn id(&self) -> String {
        format!("{}@Re{:.0}/AR{}", self.airfoil, self.reynolds, self.aspect_ratio)
    }

    pub fn area_m2(&self) -> f64 {
        self.span_m * self.chord_m
    }

    /// Lift minus `required_n`, once solved.
    pub fn lift_margin(&self, required_n: f64) -> Option<f64> {
        self.state.solution().map(|s| s.lift_force_n - required_n)
    }
}

/// Wings for one feature record, one per usable aspect ratio.
pub fn configurations_for(
    record: &AirfoilFeatureRecord,
    score: f64,
    aspect_ratios: &[f64],
    constraints: &WingConstraints,
) -> Result<Vec<WingConfiguration>> {
    constraints.validate()?;

    let mut wings = Vec::with_capacity(aspect_ratios.len());
    for &ar in aspect_ratios {
        if !(ar.is_finite() && ar > 0.0) {
            warn!("Ignoring aspect ratio {ar}");
            continue;
        }
        let (span, chord) = constraints.size(ar, record.reynolds);
        if span > constraints.max_wingspan_m {
            debug!(
                "{} AR{}: span {:.3} m exceeds limit {:.3} m",
                record.airfoil, ar, span, constraints.max_wingspan_m
            );
            continue;
        }
        wings.push(WingConfiguration {
            airfoil: record.airfoil.clone(),
            reynolds: record.reynolds,
            score,
            aspect_ratio: ar,
            span_m: span,
            chord_m: chord,
            operating_alpha_deg: record.optimum_angle_deg,
            expects_positive_lift: record.optimum_cl > 0.0,
            state: WingState::Unsolved,
        });
    }
    Ok(wings)
}

/// Wings for every ranked candidate, in ranking order.
///
/// An empty result means no geometry satisfies the constraints; it is not an
/// error.
pub fn generate_configurations(
    candidates: &[RankedAirfoilRecord],
    aspect_ratios: &[f64],
    constraints: &WingConstraints,
) -> Result<Vec<WingConfiguration>> {
    let mut wings = Vec::new();
    for candidate in candidates {
        wings.extend(configurations_for(
            &candidate.features,
            candidate.score,
            aspect_ratios,
            constraints,
        )?);
    }

    let possible = candidates.len() * aspect_ratios.len();
    info!(
        "Generated {} wing configurations ({} discarded by constraints)",
        wings.len(),
        possible - wings.len()
    );
    Ok(wings)
}
