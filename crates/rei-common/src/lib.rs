//! Common types and utilities shared across the coastal REI workspace.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod files;
pub mod region;

pub use bbox::{lon360_bbox_string, round6, BoundingBox};
pub use crs::CrsCode;
pub use error::{ReiError, ReiResult};
pub use files::search_files;
pub use region::{output_file_name, ModelVersion, Region};
