//! Configuration for the attenuation pipeline.

use std::str::FromStr;

use rei_grid::WritePolicy;
use serde::{Deserialize, Serialize};

use crate::formula::DEFAULT_DEPTH_FLOOR;

/// How the per-cell decay constant is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayModel {
    /// k derived from the exposure value of each cell.
    #[default]
    ExposureDerived,
    /// A single k for every cell.
    Constant(f64),
}

/// Treatment of unmasked exposure cells outside the REI domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidExposurePolicy {
    /// Write the cell as nodata and count it.
    #[default]
    Mask,
    /// Abort on the first invalid cell.
    Fail,
}

impl InvalidExposurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mask => "mask",
            Self::Fail => "fail",
        }
    }
}

impl FromStr for InvalidExposurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mask" => Ok(Self::Mask),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "unknown invalid-exposure policy '{}', expected mask or fail",
                other
            )),
        }
    }
}

/// Configuration for one attenuation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttenuationConfig {
    /// Source of the decay constant.
    pub decay: DecayModel,

    /// Depths at or below this value (m) are raised to it before decay.
    pub depth_floor: f64,

    /// Multiply in the slope term (requires `slope.tif`).
    pub use_slope: bool,

    /// What to do with exposure cells where REI <= 0 or is not finite.
    pub invalid_exposure: InvalidExposurePolicy,

    /// Whether an existing output may be replaced.
    pub write_policy: WritePolicy,
}

impl Default for AttenuationConfig {
    fn default() -> Self {
        Self {
            decay: DecayModel::ExposureDerived,
            depth_floor: DEFAULT_DEPTH_FLOOR,
            use_slope: false,
            invalid_exposure: InvalidExposurePolicy::Mask,
            write_policy: WritePolicy::Reject,
        }
    }
}

impl AttenuationConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("REI_DEPTH_FLOOR") {
            if let Ok(floor) = val.parse() {
                config.depth_floor = floor;
            }
        }

        if let Ok(val) = std::env::var("REI_DECAY_CONSTANT") {
            if let Ok(k) = val.parse() {
                config.decay = DecayModel::Constant(k);
            }
        }

        if let Ok(val) = std::env::var("REI_USE_SLOPE") {
            config.use_slope = parse_bool(&val);
        }

        if let Ok(val) = std::env::var("REI_INVALID_EXPOSURE") {
            if let Ok(policy) = val.parse() {
                config.invalid_exposure = policy;
            }
        }

        if let Ok(val) = std::env::var("REI_OVERWRITE") {
            config.write_policy = WritePolicy::from_force(parse_bool(&val));
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.depth_floor.is_finite() || self.depth_floor <= 0.0 {
            return Err(format!(
                "depth_floor must be finite and > 0, got {}",
                self.depth_floor
            ));
        }

        if let DecayModel::Constant(k) = self.decay {
            if !k.is_finite() || k <= 0.0 {
                return Err(format!("decay constant must be finite and > 0, got {}", k));
            }
        }

        Ok(())
    }
}

fn parse_bool(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}
