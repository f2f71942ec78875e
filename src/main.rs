//! Wing analyzer
//!
//! Ranks a family of NACA 4-digit sections for a mission and sizes feasible
//! rectangular wings for them, using the closed-form reference models.
//!
//! Usage:
//! ```
//! cargo run --release -- [OPTIONS]
//! ```

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use log::{info, LevelFilter};
use polars::prelude::*;
use wing_analyzer_calc::{
    compare_missions, run_pipeline, tables, top_n, AirfoilGeometry, AnalysisSettings,
    LiftingLineSolver, ThinAirfoilModel,
};

/// Sections analysed when no list is given
const DEFAULT_FAMILY: [&str; 8] = [
    "0009", "0012", "2412", "2415", "4412", "4415", "6409", "6412",
];

/// Points per airfoil outline
const OUTLINE_POINTS: usize = 81;

/// Command line arguments for the wing analyzer
#[derive(Parser, Debug)]
#[command(
    name = "Wing Analyzer",
    about = "Ranks airfoils for a mission and sizes wings that lift the MTOW",
    long_about = None
)]
struct Args {
    /// TOML settings file (WING_ANALYZER_* environment variables override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mission profile (payload, endurance, trainer or a custom one)
    #[arg(short, long)]
    mission: Option<String>,

    /// NACA 4-digit codes to analyse, comma separated
    #[arg(long, value_delimiter = ',')]
    airfoils: Vec<String>,

    /// Maximum take-off weight (kg)
    #[arg(long)]
    mtow: Option<f64>,

    /// Maximum wingspan (m)
    #[arg(long)]
    max_span: Option<f64>,

    /// Design airspeed (m/s)
    #[arg(long)]
    velocity: Option<f64>,

    /// Ranked candidates sized into wings
    #[arg(long)]
    top_n: Option<usize>,

    /// Solver worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Print the ranking under every mission profile
    #[arg(long)]
    compare: bool,

    /// Directory to write features.csv, ranking.csv and wings.csv into
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn apply(&self, settings: &mut AnalysisSettings) {
        if let Some(m) = &self.mission {
            settings.mission = m.clone();
        }
        if let Some(v) = self.mtow {
            settings.mtow_kg = v;
        }
        if let Some(v) = self.max_span {
            settings.max_wingspan_m = v;
        }
        if let Some(v) = self.velocity {
            settings.velocity_ms = v;
        }
        if let Some(v) = self.top_n {
            settings.top_n = v;
        }
        if let Some(v) = self.workers {
            settings.workers = v;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let mut settings = AnalysisSettings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    let codes: Vec<String> = if args.airfoils.is_empty() {
        DEFAULT_FAMILY.iter().map(|c| c.to_string()).collect()
    } else {
        args.airfoils.clone()
    };
    let mut airfoils = Vec::with_capacity(codes.len());
    for code in &codes {
        let geometry = AirfoilGeometry::naca4(code, OUTLINE_POINTS)
            .ok_or_else(|| format!("'{code}' is not a NACA 4-digit code"))?;
        airfoils.push(geometry);
    }

    let mission = settings.mission_profile(&settings.mission)?;
    let cancel = AtomicBool::new(false);
    let outcome = run_pipeline(
        &airfoils,
        &ThinAirfoilModel::default(),
        &LiftingLineSolver::default(),
        &settings,
        &mission,
        &cancel,
    )?;

    let features: DataFrame = tables::features_table(&outcome.features)?;
    let ranking: DataFrame = tables::ranking_table(top_n(&outcome.ranking, settings.top_n))?;
    let wings: DataFrame = tables::wing_table(
        &outcome.feasible,
        outcome.required_lift_n,
        settings.constants.g,
    )?;

    println!("Feature records ({})", outcome.feature_report);
    println!("{features}");
    println!("\nRanking for mission '{}'", outcome.mission);
    println!("{ranking}");

    if args.compare {
        for (name, ranked) in compare_missions(&outcome.features, &settings.all_profiles()?) {
            let best = tables::ranking_table(top_n(&ranked, 3))?;
            println!("\nTop 3 for '{name}'");
            println!(
                "{}",
                best.select(["rank", "airfoil", "reynolds", "score"])?
            );
        }
    }

    println!(
        "\nFeasible wings ({}; required lift {:.1} N = {:.2} kg)",
        outcome.wing_report,
        outcome.required_lift_n,
        settings.constants.newtons_to_kg(outcome.required_lift_n)
    );
    if outcome.feasible.is_empty() {
        println!("No wing satisfies the constraints");
    } else {
        println!("{wings}");
    }

    if let Some(dir) = &args.output {
        tables::write_outcome(&outcome, settings.constants.g, dir)?;
        info!("Tables written to {}", dir.display());
    }
    Ok(())
}
