//! Error types shared by the coastal REI crates.

use thiserror::Error;

/// Result type alias using ReiError.
pub type ReiResult<T> = Result<T, ReiError>;

/// Errors raised while parsing shared workflow parameters.
#[derive(Debug, Error)]
pub enum ReiError {
    #[error("Unknown region '{0}'. Expected one of: sog, qcs, ncc, wcvi, hg")]
    InvalidRegion(String),

    #[error("Invalid model version '{0}'. Expected an integer from 1 to 5")]
    InvalidVersion(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Directory does not exist: {0}")]
    MissingDirectory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
