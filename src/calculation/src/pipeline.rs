/// End-to-end analysis: sweep → features → ranking → wing generation →
/// solve → filter.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;

use log::info;

use crate::aerodynamics::{AirfoilGeometry, CoefficientPredictor, WingSolver};
use crate::config::AnalysisSettings;
use crate::error::{AnalysisError, BatchReport, Result};
use crate::features::{extract_feature_batch, AirfoilFeatureRecord};
use crate::scoring::{rank_airfoils, top_n, MissionProfile, RankedAirfoilRecord};
use crate::selection::evaluate_wings;
use crate::sweep::sweep_airfoils;
use crate::wing::{generate_configurations, WingConfiguration};

/// Every intermediate record set of one run, with the per-stage reports.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub mission: String,
    pub features: Vec<AirfoilFeatureRecord>,
    /// Full ranking; only the first `top_n` entries were sized into wings
    pub ranking: Vec<RankedAirfoilRecord>,
    /// Every generated wing with its final state
    pub configurations: Vec<WingConfiguration>,
    pub feasible: Vec<WingConfiguration>,
    pub required_lift_n: f64,
    pub sweep_report: BatchReport,
    pub feature_report: BatchReport,
    pub wing_report: BatchReport,
}

pub fn run_pipeline<P, S>(
    airfoils: &[AirfoilGeometry],
    predictor: &P,
    solver: &S,
    settings: &AnalysisSettings,
    mission: &MissionProfile,
    cancel: &AtomicBool,
) -> Result<PipelineOutcome>
where
    P: CoefficientPredictor + ?Sized,
    S: WingSolver + Sync + ?Sized,
{
    settings.validate()?;
    info!(
        "Analysing {} airfoils for mission '{}'",
        airfoils.len(),
        mission.name()
    );

    let sweeps = sweep_airfoils(predictor, airfoils, &settings.sweep).into_result("coefficient sweep")?;
    let extracted = extract_feature_batch(&sweeps.items, &settings.feature_settings())
        .into_result("feature extraction")?;
    if extracted.items.is_empty() {
        return Err(AnalysisError::AllItemsFailed {
            stage: "feature extraction",
            attempted: extracted.report.attempted,
            report: extracted.report,
        });
    }

    let ranking = rank_airfoils(&extracted.items, mission);
    let candidates = top_n(&ranking, settings.top_n);
    let configurations = generate_configurations(
        candidates,
        &settings.aspect_ratios,
        &settings.wing_constraints(),
    )?;

    let sections: HashMap<String, AirfoilGeometry> = airfoils
        .iter()
        .map(|a| (a.name.clone(), a.clone()))
        .collect();
    let evaluation = evaluate_wings(
        configurations,
        &sections,
        solver,
        &settings.filter_settings(),
        cancel,
    )?;

    info!(
        "Mission '{}': {} candidates, {} wings, {} feasible",
        mission.name(),
        ranking.len(),
        evaluation.configurations.len(),
        evaluation.feasible.len()
    );

    Ok(PipelineOutcome {
        mission: mission.name().to_string(),
        features: extracted.items,
        ranking,
        configurations: evaluation.configurations,
        feasible: evaluation.feasible,
        required_lift_n: evaluation.required_lift_n,
        sweep_report: sweeps.report,
        feature_report: extracted.report,
        wing_report: evaluation.report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aerodynamics::{LiftingLineSolver, SectionCoefficients, ThinAirfoilModel};
    use crate::sweep::SweepSettings;
    use crate::wing::WingState;

    struct BrokenPredictor;

    impl CoefficientPredictor for BrokenPredictor {
        fn predict(
            &self,
            geometry: &AirfoilGeometry,
            _alpha_deg: f64,
            _reynolds: f64,
        ) -> Result<SectionCoefficients> {
            Err(AnalysisError::Predictor {
                airfoil: geometry.name.clone(),
                reason: "no model loaded".into(),
            })
        }
    }

    fn family() -> Vec<AirfoilGeometry> {
        ["0012", "2412", "4412", "6409"]
            .iter()
            .filter_map(|c| AirfoilGeometry::naca4(c, 61))
            .collect()
    }

    fn settings(mtow_kg: f64) -> AnalysisSettings {
        AnalysisSettings {
            sweep: SweepSettings {
                re_points: 3,
                ..SweepSettings::default()
            },
            mtow_kg,
            ..AnalysisSettings::default()
        }
    }

    fn run(settings: &AnalysisSettings, mission: &str, cancel: bool) -> Result<PipelineOutcome> {
        run_pipeline(
            &family(),
            &ThinAirfoilModel::default(),
            &LiftingLineSolver::default(),
            settings,
            &MissionProfile::canonical(mission).unwrap(),
            &AtomicBool::new(cancel),
        )
    }

    #[test]
    fn test_end_to_end_light_aircraft() {
        let s = settings(0.5);
        let out = run(&s, "payload", false).unwrap();

        assert_eq!(out.sweep_report.succeeded, 4);
        assert_eq!(out.features.len(), 4 * 3);
        assert_eq!(out.ranking.len(), 12);
        assert!(out.ranking.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(out.ranking[0].rank, 1);

        assert!(!out.configurations.is_empty());
        assert!(out.configurations.iter().all(|c| c.span_m <= s.max_wingspan_m));
        assert!(!out.feasible.is_empty());
        for wing in &out.feasible {
            assert!(matches!(wing.state, WingState::Solved(_)));
            assert!(wing.lift_margin(out.required_lift_n).unwrap() >= 0.0);
        }
        assert!(out.feasible.windows(2).all(|w| w[0].span_m <= w[1].span_m));
    }

    #[test]
    fn test_optimum_angle_inside_operating_window() {
        let out = run(&settings(0.5), "endurance", false).unwrap();
        assert!(out
            .features
            .iter()
            .all(|f| (0.0..=5.0).contains(&f.optimum_angle_deg)));
    }

    #[test]
    fn test_heavy_aircraft_has_no_feasible_wing() {
        let out = run(&settings(500.0), "payload", false).unwrap();
        assert!(out.feasible.is_empty());
        assert!(out
            .configurations
            .iter()
            .all(|c| !matches!(c.state, WingState::Solved(_))));
    }

    #[test]
    fn test_runs_are_deterministic() {
        let s = settings(0.5);
        let a = run(&s, "trainer", false).unwrap();
        let b = run(&s, "trainer", false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missions_rank_differently() {
        let s = settings(0.5);
        let payload = run(&s, "payload", false).unwrap();
        let trainer = run(&s, "trainer", false).unwrap();
        assert_eq!(payload.features, trainer.features);
        assert_eq!(payload.mission, "payload");
        assert_eq!(trainer.ranking[0].mission, "trainer");
    }

    #[test]
    fn test_cancelled_run_leaves_wings_unsolved() {
        let out = run(&settings(0.5), "payload", true).unwrap();
        assert_eq!(out.wing_report.skipped, out.configurations.len());
        assert!(out.feasible.is_empty());
    }

    #[test]
    fn test_predictor_failure_everywhere() {
        let result = run_pipeline(
            &family(),
            &BrokenPredictor,
            &LiftingLineSolver::default(),
            &settings(0.5),
            &MissionProfile::canonical("payload").unwrap(),
            &AtomicBool::new(false),
        );
        match result {
            Err(AnalysisError::AllItemsFailed { stage, attempted, report }) => {
                assert_eq!(stage, "coefficient sweep");
                assert_eq!(attempted, 4);
                assert_eq!(report.failed(), 4);
            }
            other => panic!("expected aggregate failure, got {other:?}"),
        }
    }

    #[test]
    fn test_no_airfoils() {
        let result = run_pipeline(
            &[],
            &ThinAirfoilModel::default(),
            &LiftingLineSolver::default(),
            &settings(0.5),
            &MissionProfile::canonical("payload").unwrap(),
            &AtomicBool::new(false),
        );
        assert!(matches!(result, Err(AnalysisError::AllItemsFailed { .. })));
    }
}
