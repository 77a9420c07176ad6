//! Coordinate reference system transformations.
//!
//! Implements the projections the workflow needs from scratch, without
//! linking PROJ. NAD83 and WGS84 are treated as the same datum, which is
//! well under a metre of difference for British Columbia.

pub mod albers;
pub mod transform;

pub use albers::AlbersEqualArea;
pub use transform::{convert_coordinates, transform, ProjectionError};
