//! Spline interpolation settings.

use serde::{Deserialize, Serialize};

/// Settings shared by every field of an interpolation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplineConfig {
    /// Output cell size in map units (m).
    pub cell_size: f64,

    /// Regularization weight (tau squared); larger gives a smoother surface.
    pub weight: f64,

    /// Largest point count solved in one system.
    pub max_points: usize,

    /// Sentinel for cells the surface cannot be evaluated at.
    pub nodata: f64,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            cell_size: 20.0,
            weight: 0.1,
            max_points: 5000,
            nodata: -9999.0,
        }
    }
}

impl SplineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(format!("cell_size must be > 0, got {}", self.cell_size));
        }

        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(format!("weight must be > 0, got {}", self.weight));
        }

        if self.max_points < 3 {
            return Err("max_points must be at least 3".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SplineConfig::default();
        assert_eq!(config.cell_size, 20.0);
        assert_eq!(config.weight, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid() {
        let bad_cell = SplineConfig {
            cell_size: 0.0,
            ..Default::default()
        };
        assert!(bad_cell.validate().is_err());

        let bad_weight = SplineConfig {
            weight: -0.1,
            ..Default::default()
        };
        assert!(bad_weight.validate().is_err());

        let bad_points = SplineConfig {
            max_points: 2,
            ..Default::default()
        };
        assert!(bad_points.validate().is_err());
    }
}
