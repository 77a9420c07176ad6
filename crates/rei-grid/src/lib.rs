//! Raster grids for the coastal exposure toolkit.
//!
//! Loads single-band GeoTIFF layers (bathymetry, slope, exposure), masks
//! their nodata cells, verifies that layers line up, and writes results back
//! with the source layer's georeferencing.
//!
//! # Architecture
//!
//! ```text
//! load_layer(path)
//!      │
//!      ├─► Grid (band 1, f64 cells)
//!      ├─► Nodata (GDAL_NODATA tag)
//!      └─► GeoProfile (GeoTIFF tags, verbatim)
//!               │
//!               ▼
//! check_coregistered(reference, other)
//!               │
//!               ▼
//! MaskedGrid::from_grid ──► zip_with (mask union) ──► filled(sentinel)
//!                                                          │
//!                                                          ▼
//!                                       write_layer(path, grid, profile, policy)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rei_grid::{load_layer, write_layer, WritePolicy};
//!
//! let exposure = load_layer("rei.tif")?;
//! let doubled = exposure.masked().map(|v| v * 2.0);
//! let out = doubled.filled(exposure.nodata.value_or(-9999.0));
//! write_layer("rei_x2.tif", &out, &exposure.profile, WritePolicy::Reject)?;
//! ```

pub mod align;
pub mod error;
pub mod mask;
pub mod reader;
pub mod types;
pub mod writer;

pub use align::{check_coregistered, TRANSFORM_TOLERANCE};
pub use error::{GridError, Result};
pub use mask::{MaskedGrid, MaskedStats};
pub use reader::{load_layer, Layer};
pub use types::{GeoKeys, GeoProfile, GeoTransform, Grid, Nodata, SampleFormat};
pub use writer::{write_layer, WritePolicy};

/// Output sentinel used when the exposure layer declares none.
pub const DEFAULT_NODATA: f64 = -9999.0;
