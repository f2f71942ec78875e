//! Airfoil selection and wing sizing for small fixed-wing aircraft.
//!
//! This library turns coefficient sweeps of candidate airfoils into a
//! mission-ranked shortlist and a set of feasible rectangular wings:
//! - Feature extraction (max L/D, stall, zero-angle behaviour) per Reynolds number
//! - Mission-weighted ranking over min-max normalized features
//! - Wing geometry generation under span / area / Reynolds constraints
//! - Parallel 3D solve and MTOW lift filtering
//!
//! # Features
//!
//! - **Pluggable**: the coefficient predictor and the 3D solver are traits;
//!   closed-form reference models are included
//! - **Fault tolerant**: per-item failures are counted, never fatal to a batch
//! - **Tabular output**: every record set exports to a polars `DataFrame`

#![warn(clippy::doc_markdown)]
#![allow(clippy::inconsistent_struct_constructor)]

pub mod aerodynamics;
pub mod config;
pub mod constants;
pub mod error;
pub mod features;
pub mod interp;
pub mod pipeline;
pub mod scoring;
pub mod selection;
pub mod sweep;
pub mod tables;
pub mod wing;

// Re-export key types and functions for easy use
pub use aerodynamics::{
    AirfoilGeometry, CoefficientPredictor, LiftingLineSolver, ThinAirfoilModel, WingSolver,
};
pub use config::AnalysisSettings;
pub use constants::Constants;
pub use error::{AnalysisError, BatchOutcome, BatchReport, Result, SolveFailure};
pub use features::{extract_feature_batch, extract_features, AirfoilFeatureRecord};
pub use pipeline::{run_pipeline, PipelineOutcome};
pub use scoring::{compare_missions, rank_airfoils, top_n, Feature, MissionProfile, RankedAirfoilRecord};
pub use selection::{evaluate_wings, filter_feasible, WingEvaluation};
pub use sweep::{sweep_airfoils, AirfoilCoefficientSample, SweepSettings};
pub use wing::{generate_configurations, WingConfiguration, WingSizing, WingState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
