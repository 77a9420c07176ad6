//! Error types for raster grid handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, combining or writing rasters.
#[derive(Error, Debug)]
pub enum GridError {
    /// File I/O error (missing input, unwritable output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding or encoding error.
    #[error("TIFF error: {0}")]
    Tiff(String),

    /// The raster has a sample type we cannot represent.
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// The raster contains no bands.
    #[error("raster {0} contains no bands")]
    NoBands(String),

    /// Cell buffer length does not match the declared dimensions.
    #[error("grid data has {actual} cells but dimensions {width}x{height} need {expected}")]
    BadLength {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// Two grids that must be combined have different shapes.
    #[error("{layer}: dimensions {actual:?} do not match reference {expected:?}")]
    DimensionMismatch {
        layer: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Two grids share a shape but not a georeferencing.
    #[error("{layer} is not co-registered with the reference layer: {reason}")]
    Misaligned { layer: String, reason: String },

    /// GDAL_NODATA tag could not be parsed.
    #[error("invalid nodata value: {0}")]
    InvalidNodata(String),

    /// Output exists and the write policy forbids replacing it.
    #[error("output {0} already exists; rerun with overwrite enabled to replace it")]
    OutputExists(PathBuf),
}

impl From<tiff::TiffError> for GridError {
    fn from(err: tiff::TiffError) -> Self {
        match err {
            tiff::TiffError::IoError(e) => GridError::Io(e),
            other => GridError::Tiff(other.to_string()),
        }
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
