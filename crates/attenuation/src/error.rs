//! Error types for the attenuation pipeline.

use std::path::PathBuf;

use rei_grid::GridError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttenuationError {
    /// Loading, aligning or writing a raster failed.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// An unmasked exposure cell is outside the REI domain and the policy is `fail`.
    #[error("invalid exposure value {value} at cell ({col}, {row}); REI must be finite and > 0")]
    InvalidExposure { col: usize, row: usize, value: f64 },

    /// Slope attenuation requested but the slope raster is absent.
    #[error("slope attenuation requested but {0} does not exist")]
    MissingSlope(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AttenuationError>;
