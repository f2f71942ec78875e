/// Tabular exports of the record sets.
///
/// One row per record; these frames are what persistence and plotting
/// consume.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::features::AirfoilFeatureRecord;
use crate::pipeline::PipelineOutcome;
use crate::scoring::{Feature, RankedAirfoilRecord};
use crate::wing::{WingConfiguration, WingState};

/// One row per (airfoil, Reynolds number) feature record.
pub fn features_table(records: &[AirfoilFeatureRecord]) -> Result<DataFrame> {
    let col = |f: fn(&AirfoilFeatureRecord) -> f64| records.iter().map(f).collect::<Vec<f64>>();

    let df = df!(
        "airfoil" => records.iter().map(|r| r.airfoil.clone()).collect::<Vec<String>>(),
        "reynolds" => col(|r| r.reynolds),
        "cl_max" => col(|r| r.cl_max),
        "stall_angle_deg" => col(|r| r.stall_angle_deg),
        "stall_captured" => records.iter().map(|r| r.stall_captured).collect::<Vec<bool>>(),
        "max_lift_to_drag" => col(|r| r.max_lift_to_drag),
        "optimum_angle_deg" => col(|r| r.optimum_angle_deg),
        "optimum_cl" => col(|r| r.optimum_cl),
        "optimum_cd" => col(|r| r.optimum_cd),
        "cl_at_zero" => col(|r| r.cl_at_zero),
        "cd_at_zero" => col(|r| r.cd_at_zero),
        "angle_diff" => col(|r| r.angle_diff),
        "zero_lift_angle_deg" => records.iter().map(|r| r.zero_lift_angle_deg).collect::<Vec<Option<f64>>>(),
    )?;
    Ok(df)
}

/// One row per ranked airfoil, with a `<feature>_n` column per normalized
/// feature.
pub fn ranking_table(ranked: &[RankedAirfoilRecord]) -> Result<DataFrame> {
    let mut df = df!(
        "mission" => ranked.iter().map(|r| r.mission.clone()).collect::<Vec<String>>(),
        "rank" => ranked.iter().map(|r| r.rank as u32).collect::<Vec<u32>>(),
        "airfoil" => ranked.iter().map(|r| r.features.airfoil.clone()).collect::<Vec<String>>(),
        "reynolds" => ranked.iter().map(|r| r.features.reynolds).collect::<Vec<f64>>(),
        "score" => ranked.iter().map(|r| r.score).collect::<Vec<f64>>(),
    )?;

    for feature in Feature::ALL {
        let name = format!("{}_n", feature.name());
        let values: Vec<f64> = ranked.iter().map(|r| r.normalized.get(feature)).collect();
        df.with_column(Series::new(name.as_str().into(), values))?;
    }
    Ok(df)
}

/// One row per wing configuration. `passes` is true for solved wings lifting
/// at least `required_lift_n`.
pub fn wing_table(
    configurations: &[WingConfiguration],
    required_lift_n: f64,
    g: f64,
) -> Result<DataFrame> {
    let solution = |f: fn(&crate::wing::WingSolution) -> f64| {
        configurations
            .iter()
            .map(|c| c.state.solution().map(f))
            .collect::<Vec<Option<f64>>>()
    };
    let geometry = |f: fn(&WingConfiguration) -> f64| configurations.iter().map(f).collect::<Vec<f64>>();

    let df = df!(
        "airfoil" => configurations.iter().map(|c| c.airfoil.clone()).collect::<Vec<String>>(),
        "reynolds" => geometry(|c| c.reynolds),
        "score" => geometry(|c| c.score),
        "aspect_ratio" => geometry(|c| c.aspect_ratio),
        "span_m" => geometry(|c| c.span_m),
        "chord_m" => geometry(|c| c.chord_m),
        "area_m2" => geometry(|c| c.area_m2()),
        "alpha_deg" => geometry(|c| c.operating_alpha_deg),
        "status" => configurations.iter().map(|c| c.state.label().to_string()).collect::<Vec<String>>(),
        "cl" => solution(|s| s.cl),
        "cd" => solution(|s| s.cd),
        "cm" => solution(|s| s.cm),
        "lift_n" => solution(|s| s.lift_force_n),
        "lift_kg" => configurations
            .iter()
            .map(|c| c.state.solution().map(|s| s.lift_force_n / g))
            .collect::<Vec<Option<f64>>>(),
        "margin_n" => configurations
            .iter()
            .map(|c| c.lift_margin(required_lift_n))
            .collect::<Vec<Option<f64>>>(),
        "passes" => configurations
            .iter()
            .map(|c| {
                matches!(c.state, WingState::Solved(_))
                    && c.lift_margin(required_lift_n).is_some_and(|m| m >= 0.0)
            })
            .collect::<Vec<bool>>(),
        "failure" => configurations
            .iter()
            .map(|c| match &c.state {
                WingState::SolveFailed(f) => Some(f.to_string()),
                _ => None,
            })
            .collect::<Vec<Option<String>>>(),
    )?;
    Ok(df)
}

/// Write `df` as CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .map_err(|e| AnalysisError::Table(format!("{}: {}", path.display(), e)))?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Write `features.csv`, `ranking.csv` and `wings.csv` for a run into `dir`.
///
/// The ranking and wing tables hold every record of the run, not only the
/// shortlist that was sized or the wings that passed.
pub fn write_outcome(outcome: &PipelineOutcome, g: f64, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AnalysisError::Table(format!("{}: {}", dir.display(), e)))?;

    let mut features = features_table(&outcome.features)?;
    let mut ranking = ranking_table(&outcome.ranking)?;
    let mut wings = wing_table(&outcome.configurations, outcome.required_lift_n, g)?;
    write_csv(&mut features, &dir.join("features.csv"))?;
    write_csv(&mut ranking, &dir.join("ranking.csv"))?;
    write_csv(&mut wings, &dir.join("wings.csv"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolveFailure;
    use crate::scoring::{rank_airfoils, MissionProfile};
    use crate::wing::WingSolution;
    use approx::assert_relative_eq;

    fn record(airfoil: &str, ld: f64) -> AirfoilFeatureRecord {
        AirfoilFeatureRecord {
            airfoil: airfoil.to_string(),
            reynolds: 2.0e5,
            cl_max: 1.3,
            stall_angle_deg: 12.0,
            stall_captured: true,
            max_lift_to_drag: ld,
            optimum_angle_deg: 4.0,
            optimum_cl: 0.8,
            optimum_cd: 0.8 / ld,
            cl_at_zero: 0.35,
            cd_at_zero: 0.011,
            angle_diff: 8.0,
            zero_lift_angle_deg: None,
        }
    }

    fn wing(state: WingState) -> WingConfiguration {
        WingConfiguration {
            airfoil: "naca2412".into(),
            reynolds: 2.0e5,
            score: 0.7,
            aspect_ratio: 6.0,
            span_m: 1.2,
            chord_m: 0.2,
            operating_alpha_deg: 4.0,
            expects_positive_lift: true,
            state,
        }
    }

    fn solution(lift: f64) -> WingSolution {
        WingSolution {
            cl: 0.6,
            cd: 0.03,
            cm: -0.05,
            lift_force_n: lift,
        }
    }

    #[test]
    fn test_features_table_shape() {
        let records = vec![record("naca2412", 60.0), record("naca4412", 70.0)];
        let df = features_table(&records).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 13);

        let zero_lift = df.column("zero_lift_angle_deg").unwrap();
        assert_eq!(zero_lift.null_count(), 2);
        let ld = df.column("max_lift_to_drag").unwrap().as_materialized_series().f64().unwrap().get(1);
        assert_eq!(ld, Some(70.0));
    }

    #[test]
    fn test_ranking_table_columns() {
        let records = vec![record("naca2412", 60.0), record("naca4412", 70.0)];
        let ranked = rank_airfoils(&records, &MissionProfile::canonical("endurance").unwrap());
        let df = ranking_table(&ranked).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 5 + Feature::ALL.len());
        assert!(df.column("max_lift_to_drag_n").is_ok());
        assert!(df.column("optimum_cd_n").is_ok());

        let first = df.column("airfoil").unwrap().as_materialized_series().str().unwrap().get(0);
        assert_eq!(first, Some("naca4412"));
        let rank = df.column("rank").unwrap().as_materialized_series().u32().unwrap().get(0);
        assert_eq!(rank, Some(1));
    }

    #[test]
    fn test_wing_table_status() {
        let configs = vec![
            wing(WingState::Solved(solution(20.0))),
            wing(WingState::Infeasible(solution(5.0))),
            wing(WingState::SolveFailed(SolveFailure::NonFinite)),
            wing(WingState::Unsolved),
        ];
        let df = wing_table(&configs, 9.81, 9.81).unwrap();
        assert_eq!(df.height(), 4);

        let status = df.column("status").unwrap().as_materialized_series().str().unwrap().clone();
        assert_eq!(status.get(0), Some("solved"));
        assert_eq!(status.get(1), Some("infeasible"));
        assert_eq!(status.get(2), Some("solve-failed"));
        assert_eq!(status.get(3), Some("unsolved"));

        let passes = df.column("passes").unwrap().as_materialized_series().bool().unwrap().clone();
        assert_eq!(passes.get(0), Some(true));
        assert_eq!(passes.get(1), Some(false));
        assert_eq!(passes.get(2), Some(false));

        let lift_kg = df.column("lift_kg").unwrap().as_materialized_series().f64().unwrap().clone();
        assert_relative_eq!(lift_kg.get(0).unwrap(), 20.0 / 9.81);
        assert_eq!(lift_kg.get(3), None);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.csv");
        let mut df = features_table(&[record("naca2412", 60.0)]).unwrap();
        write_csv(&mut df, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("airfoil,reynolds,cl_max"));
        assert!(text.contains("naca2412"));
    }

    #[test]
    fn test_write_outcome_exports_full_ranking() {
        use std::sync::atomic::AtomicBool;

        use crate::aerodynamics::{AirfoilGeometry, LiftingLineSolver, ThinAirfoilModel};
        use crate::config::AnalysisSettings;
        use crate::pipeline::run_pipeline;
        use crate::sweep::SweepSettings;

        let airfoils: Vec<AirfoilGeometry> = ["0012", "2412", "4412"]
            .iter()
            .filter_map(|c| AirfoilGeometry::naca4(c, 61))
            .collect();
        let settings = AnalysisSettings {
            sweep: SweepSettings {
                re_points: 2,
                ..SweepSettings::default()
            },
            mtow_kg: 0.5,
            top_n: 1,
            ..AnalysisSettings::default()
        };
        let outcome = run_pipeline(
            &airfoils,
            &ThinAirfoilModel::default(),
            &LiftingLineSolver::default(),
            &settings,
            &MissionProfile::canonical("payload").unwrap(),
            &AtomicBool::new(false),
        )
        .unwrap();
        assert_eq!(outcome.ranking.len(), 6);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        write_outcome(&outcome, 9.81, &out).unwrap();

        let ranking = std::fs::read_to_string(out.join("ranking.csv")).unwrap();
        assert_eq!(ranking.lines().count(), 1 + outcome.ranking.len());
        let wings = std::fs::read_to_string(out.join("wings.csv")).unwrap();
        assert_eq!(wings.lines().count(), 1 + outcome.configurations.len());
        assert!(out.join("features.csv").exists());
    }
}
