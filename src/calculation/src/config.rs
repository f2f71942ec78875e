/// Analysis settings and their loading.
///
/// Every field has a default equal to the reference mission constants, so an
/// empty file (or no file at all) yields a runnable configuration.

use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, Environment, File};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{defaults, Constants};
use crate::error::{AnalysisError, Result};
use crate::features::FeatureSettings;
use crate::scoring::{Feature, MissionProfile};
use crate::selection::FilterSettings;
use crate::sweep::SweepSettings;
use crate::wing::{WingConstraints, WingSizing};

/// Environment variable prefix, e.g. `WING_ANALYZER_MTOW_KG=6.0` or
/// `WING_ANALYZER_SWEEP__RE_POINTS=4`.
pub const ENV_PREFIX: &str = "WING_ANALYZER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub sweep: SweepSettings,
    /// Angle window searched for the optimum L/D; `None` searches the whole sweep
    pub operating_alpha_deg: Option<(f64, f64)>,
    pub min_angle_samples: usize,
    pub aspect_ratios: Vec<f64>,
    pub mtow_kg: f64,
    pub max_wingspan_m: f64,
    pub velocity_ms: f64,
    pub sizing: WingSizing,
    pub constants: Constants,
    pub weight_tolerance: f64,
    /// Ranked candidates forwarded to wing generation
    pub top_n: usize,
    /// Solver worker threads
    pub workers: usize,
    /// Default mission profile name
    pub mission: String,
    /// Custom profiles, `[missions.<name>]` tables of feature weights
    pub missions: BTreeMap<String, BTreeMap<Feature, f64>>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            sweep: SweepSettings::default(),
            operating_alpha_deg: Some(defaults::OPERATING_ALPHA_DEG),
            min_angle_samples: defaults::MIN_ANGLE_SAMPLES,
            aspect_ratios: defaults::ASPECT_RATIOS.to_vec(),
            mtow_kg: defaults::MTOW_KG,
            max_wingspan_m: defaults::MAX_WINGSPAN_M,
            velocity_ms: defaults::VELOCITY_MS,
            sizing: WingSizing::default(),
            constants: Constants::default(),
            weight_tolerance: defaults::WEIGHT_TOLERANCE,
            top_n: defaults::TOP_N,
            workers: defaults::WORKERS,
            mission: "payload".to_string(),
            missions: BTreeMap::new(),
        }
    }
}

impl AnalysisSettings {
    /// Load from an optional TOML file, then `WING_ANALYZER_*` environment
    /// overrides, and validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// First violated rule, if any.
    pub fn validate(&self) -> Result<()> {
        self.sweep.validate()?;

        let positive = [
            ("mtow_kg", self.mtow_kg),
            ("max_wingspan_m", self.max_wingspan_m),
            ("velocity_ms", self.velocity_ms),
            ("constants.rho_air", self.constants.rho_air),
            ("constants.g", self.constants.g),
            ("constants.kinematic_viscosity", self.constants.kinematic_viscosity),
            ("weight_tolerance", self.weight_tolerance),
        ];
        if let Some((name, value)) = positive
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v > 0.0))
        {
            return Err(AnalysisError::Config(format!("{name} = {value} must be positive")));
        }

        if let Some((lo, hi)) = self.operating_alpha_deg {
            if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                return Err(AnalysisError::Config(format!(
                    "operating window [{lo}, {hi}] is invalid"
                )));
            }
        }
        if self.workers == 0 {
            return Err(AnalysisError::Config("workers must be at least 1".into()));
        }
        if self.min_angle_samples < 3 {
            return Err(AnalysisError::Config(
                "min_angle_samples must be at least 3".into(),
            ));
        }
        self.wing_constraints().validate()?;

        for name in self.missions.keys() {
            self.mission_profile(name)?;
        }
        self.mission_profile(&self.mission)?;
        Ok(())
    }

    /// Resolve a profile by name: custom tables first, then the canonical set.
    pub fn mission_profile(&self, name: &str) -> Result<MissionProfile> {
        match self.missions.get(name) {
            Some(weights) => MissionProfile::new(
                name,
                weights.iter().map(|(f, w)| (*f, *w)),
                self.weight_tolerance,
            ),
            None => MissionProfile::canonical(name),
        }
    }

    /// Canonical profiles followed by custom ones not shadowing them.
    pub fn all_profiles(&self) -> Result<Vec<MissionProfile>> {
        let mut names: Vec<&str> = MissionProfile::CANONICAL.to_vec();
        names.extend(
            self.missions
                .keys()
                .map(String::as_str)
                .filter(|n| !MissionProfile::CANONICAL.contains(n)),
        );
        names.into_iter().map(|n| self.mission_profile(n)).collect()
    }

    pub fn feature_settings(&self) -> FeatureSettings {
        FeatureSettings {
            operating_alpha_deg: self.operating_alpha_deg,
            min_angle_samples: self.min_angle_samples,
        }
    }

    pub fn wing_constraints(&self) -> WingConstraints {
        WingConstraints {
            max_wingspan_m: self.max_wingspan_m,
            sizing: self.sizing,
            velocity_ms: self.velocity_ms,
            kinematic_viscosity: self.constants.kinematic_viscosity,
        }
    }

    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            mtow_kg: self.mtow_kg,
            velocity_ms: self.velocity_ms,
            constants: self.constants,
            workers: self.workers,
        }
    }
}
