//! Error types for wind and wave statistics.

use std::path::PathBuf;

use projection::ProjectionError;
use rei_common::ReiError;
use thiserror::Error;

/// Result type for wind-stats operations.
pub type WindStatsResult<T> = Result<T, WindStatsError>;

#[derive(Error, Debug)]
pub enum WindStatsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Common(#[from] ReiError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Missing required variable, dimension or file.
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Data present but malformed.
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("no files with extension '{extension}' containing '{search}' in {dir}")]
    NoFiles {
        dir: PathBuf,
        extension: String,
        search: String,
    },

    /// Input files disagree on the number of rows.
    #[error("{file} has {actual} rows, expected {expected}")]
    ShapeMismatch {
        file: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("{0} already exists")]
    OutputExists(PathBuf),

    /// NetCDF input requested in a build without the `netcdf` feature.
    #[error("NetCDF support not compiled in; rebuild with --features netcdf")]
    NetCdfUnavailable,
}
