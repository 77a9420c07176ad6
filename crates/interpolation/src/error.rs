//! Error types for spline interpolation.

use std::path::PathBuf;

use projection::ProjectionError;
use rei_grid::GridError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// The table lacks a required column.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A cell could not be parsed as a number.
    #[error("row {row}, column {column}: invalid number '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    /// No column in the table names a wind statistic.
    #[error("no mx_spd or freq columns in {0}")]
    NoFields(PathBuf),

    #[error("{found} usable points, at least {needed} required")]
    NotEnoughPoints { found: usize, needed: usize },

    #[error("{count} points exceed the limit of {max}")]
    TooManyPoints { count: usize, max: usize },

    /// Spline system could not be solved (duplicate or collinear points).
    #[error("spline system is singular")]
    Singular,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, InterpolationError>;
