/// Wing performance filter.
///
/// Solves every candidate wing at the design condition on a bounded worker
/// pool, then keeps the ones lifting at least MTOW·g.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::aerodynamics::{lift_force, AirfoilGeometry, FlightCondition, WingGeometry, WingSolver};
use crate::constants::Constants;
use crate::error::{AnalysisError, BatchReport, Result, SolveFailure};
use crate::wing::{WingConfiguration, WingSolution, WingState};

/// Design condition and pool size for a filter run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub mtow_kg: f64,
    pub velocity_ms: f64,
    pub constants: Constants,
    pub workers: usize,
}

impl FilterSettings {
    /// Lift the wing must produce (N).
    pub fn required_lift_n(&self) -> f64 {
        self.constants.weight_newtons(self.mtow_kg)
    }
}

/// Result of a filter run.
#[derive(Debug, Clone, PartialEq)]
pub struct WingEvaluation {
    /// Every input configuration, in input order, with its final state
    pub configurations: Vec<WingConfiguration>,
    /// Passing configurations, smallest span first
    pub feasible: Vec<WingConfiguration>,
    pub required_lift_n: f64,
    pub report: BatchReport,
}

/// Solve one configuration and check the output is physical.
pub fn solve_configuration<S: WingSolver + ?Sized>(
    config: &WingConfiguration,
    section: Option<&AirfoilGeometry>,
    solver: &S,
    settings: &FilterSettings,
) -> std::result::Result<WingSolution, SolveFailure> {
    let section = section.ok_or_else(|| SolveFailure::UnknownSection(config.airfoil.clone()))?;
    let wing = WingGeometry {
        span: config.span_m,
        chord: config.chord_m,
        section,
    };
    let condition = FlightCondition {
        velocity: settings.velocity_ms,
        alpha_deg: config.operating_alpha_deg,
    };

    let c = solver.solve(&wing, &condition)?;
    if !(c.cl.is_finite() && c.cd.is_finite() && c.cm.is_finite()) {
        return Err(SolveFailure::NonFinite);
    }
    if config.expects_positive_lift && c.cl < 0.0 {
        return Err(SolveFailure::NegativeLift(c.cl));
    }
    if c.cd < 0.0 {
        return Err(SolveFailure::NegativeDrag(c.cd));
    }

    Ok(WingSolution {
        cl: c.cl,
        cd: c.cd,
        cm: c.cm,
        lift_force_n: lift_force(
            c.cl,
            settings.constants.rho_air,
            settings.velocity_ms,
            wing.area(),
        ),
    })
}

/// Mark solved wings below `required_n` as infeasible and return the passing
/// ones sorted by span ascending, then lift margin descending.
pub fn filter_feasible(
    configurations: &mut [WingConfiguration],
    required_n: f64,
) -> Vec<WingConfiguration> {
    let mut feasible = Vec::new();
    for config in configurations.iter_mut() {
        if let WingState::Solved(solution) = config.state {
            if solution.lift_force_n >= required_n {
                feasible.push(config.clone());
            } else {
                debug!(
                    "{}: lift {:.2} N below required {:.2} N",
                    config.id(),
                    solution.lift_force_n,
                    required_n
                );
                config.state = WingState::Infeasible(solution);
            }
        }
    }

    feasible.sort_by(|a, b| {
        let margin = |c: &WingConfiguration| c.lift_margin(required_n).unwrap_or(f64::NEG_INFINITY);
        a.span_m
            .total_cmp(&b.span_m)
            .then_with(|| margin(b).total_cmp(&margin(a)))
            .then_with(|| a.id().cmp(&b.id()))
    });
    feasible
}

/// Solve and filter a batch of unsolved configurations.
///
/// Only `Unsolved` configurations are solved; any other state is carried
/// through untouched and left out of the report. Solver failures are isolated
/// to their configuration. Once `cancel` is set no further solves start; the
/// remaining configurations stay `Unsolved` and count as skipped.
pub fn evaluate_wings<S: WingSolver + Sync + ?Sized>(
    configurations: Vec<WingConfiguration>,
    sections: &HashMap<String, AirfoilGeometry>,
    solver: &S,
    settings: &FilterSettings,
    cancel: &AtomicBool,
) -> Result<WingEvaluation> {
    if settings.workers == 0 {
        return Err(AnalysisError::Config("workers must be at least 1".into()));
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.workers)
        .build()
        .map_err(|e| AnalysisError::Config(format!("cannot start solver pool: {e}")))?;

    let pending: Vec<bool> = configurations
        .iter()
        .map(|c| c.state == WingState::Unsolved)
        .collect();
    let carried = pending.iter().filter(|p| !**p).count();
    if carried > 0 {
        debug!("{carried} configurations already evaluated, not re-solving");
    }

    let mut solved: Vec<WingConfiguration> = pool.install(|| {
        configurations
            .into_par_iter()
            .map(|mut config| {
                if config.state != WingState::Unsolved || cancel.load(Ordering::Relaxed) {
                    return config;
                }
                let section = sections.get(&config.airfoil);
                config.state = match solve_configuration(&config, section, solver, settings) {
                    Ok(solution) => WingState::Solved(solution),
                    Err(failure) => WingState::SolveFailed(failure),
                };
                config
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for (config, _) in solved.iter().zip(&pending).filter(|(_, p)| **p) {
        match &config.state {
            WingState::Unsolved => report.record_skipped(),
            WingState::SolveFailed(failure) => {
                warn!("Solve failed for {}: {}", config.id(), failure);
                report.record_failure(
                    config.id(),
                    AnalysisError::Solve {
                        configuration: config.id(),
                        failure: failure.clone(),
                    },
                );
            }
            _ => report.record_success(),
        }
    }
    if report.skipped > 0 {
        warn!("Cancelled: {} configurations left unsolved", report.skipped);
    }

    let required_lift_n = settings.required_lift_n();
    let feasible = filter_feasible(&mut solved, required_lift_n);
    info!(
        "Wing filter: {}; {} feasible at {:.1} N required",
        report,
        feasible.len(),
        required_lift_n
    );

    Ok(WingEvaluation {
        configurations: solved,
        feasible,
        required_lift_n,
        report,
    })
}
