//! Spline interpolation of point wind statistics.
//!
//! Each `mx_spd_*` / `freq_*` column of a point table is fitted with a
//! regularized spline and rasterized onto a BC Albers grid (20 m cells and
//! weight 0.1 by default). Fields are processed one at a time; rows of a
//! raster are evaluated in parallel.
//!
//! ```text
//! hrdps_<region>.csv ─► PointTable ─┬─► field 1 ─► RegularizedSpline::fit ─► rasterize ─► <field>_spline.tif
//!                                   ├─► field 2 ─► ...
//!                                   └─► InterpolationReport ("n of m fields failed")
//! ```

mod bessel;
pub mod batch;
pub mod config;
pub mod error;
pub mod raster;
pub mod spline;
pub mod table;

pub use batch::{
    interpolate_field, interpolate_table, spline_file_name, FieldOutcome, InterpolationReport,
    SPLINE_DIR,
};
pub use config::SplineConfig;
pub use error::{InterpolationError, Result};
pub use raster::{rasterize, OutputGrid};
pub use spline::{regularized_basis, RegularizedSpline};
pub use table::{is_interpolated_field, PointTable};
