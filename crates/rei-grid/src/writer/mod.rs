//! Raster output.
//!
//! Results are written as single-band GeoTIFFs carrying the georeferencing
//! of the layer they were derived from.

mod geotiff_writer;

use serde::{Deserialize, Serialize};

pub use geotiff_writer::write_layer;

/// What to do when the output path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    /// Refuse with [`GridError::OutputExists`](crate::GridError::OutputExists).
    #[default]
    Reject,
    /// Replace the existing file.
    Overwrite,
}

impl WritePolicy {
    pub fn from_force(force: bool) -> Self {
        if force {
            WritePolicy::Overwrite
        } else {
            WritePolicy::Reject
        }
    }
}
