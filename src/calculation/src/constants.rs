/// Physical constants and default analysis parameters.
///
/// Defaults describe a small RC aircraft flying at sea level in the
/// International Standard Atmosphere.

use serde::{Deserialize, Serialize};

/// Atmosphere and gravity used for every force calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    /// Gravitational acceleration (m/s²)
    pub g: f64,

    /// Air density (kg/m³)
    /// Standard value: 1.225 kg/m³ at 15°C, 1 atm
    pub rho_air: f64,

    /// Kinematic viscosity of air (m²/s)
    pub kinematic_viscosity: f64,
}

impl Constants {
    /// Sea-level standard atmosphere.
    pub const fn new() -> Self {
        Self {
            g: 9.81,
            rho_air: 1.225,
            kinematic_viscosity: 1.46e-5,
        }
    }

    /// Dynamic pressure q = ½ρV² (Pa).
    #[inline(always)]
    pub fn dynamic_pressure(&self, velocity: f64) -> f64 {
        0.5 * self.rho_air * velocity * velocity
    }

    /// Weight (N) of a mass given in kilograms.
    pub fn weight_newtons(&self, mass_kg: f64) -> f64 {
        mass_kg * self.g
    }

    /// Mass (kg) that a force in newtons can hold up.
    pub fn newtons_to_kg(&self, force: f64) -> f64 {
        force / self.g
    }
}

impl Default for Constants {
    fn default() -> Self {
        Self::new()
    }
}

/// Defaults for the sweep, geometry and mission settings.
pub mod defaults {
    pub const ALPHA_MIN_DEG: f64 = -5.0;
    pub const ALPHA_MAX_DEG: f64 = 20.0;
    pub const ALPHA_STEP_DEG: f64 = 0.2;
    pub const RE_MIN: f64 = 1.5e5;
    pub const RE_MAX: f64 = 4.0e5;
    pub const RE_POINTS: usize = 10;

    /// Window searched for the best lift-to-drag point.
    pub const OPERATING_ALPHA_DEG: (f64, f64) = (0.0, 5.0);

    pub const MTOW_KG: f64 = 8.5;
    pub const MAX_WINGSPAN_M: f64 = 1.8;
    pub const VELOCITY_MS: f64 = 13.0;
    pub const ASPECT_RATIOS: [f64; 5] = [3.0, 4.0, 5.0, 6.0, 7.0];

    /// Allowed drift of mission weights away from 1.0.
    pub const WEIGHT_TOLERANCE: f64 = 1e-6;
    pub const TOP_N: usize = 10;
    pub const WORKERS: usize = 4;

    /// Minimum angle samples per Reynolds number for feature extraction.
    pub const MIN_ANGLE_SAMPLES: usize = 3;
}
