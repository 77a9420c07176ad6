//! Point transforms between the CRS codes the workflow supports.

use rei_common::{round6, CrsCode};
use thiserror::Error;

use crate::albers::AlbersEqualArea;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("inverse projection did not converge for ({x}, {y})")]
    NoConvergence { x: f64, y: f64 },

    #[error("coordinate ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },
}

/// Transform a point from one CRS to another.
///
/// Geographic coordinates are `(lon, lat)` in degrees; BC Albers
/// coordinates are `(easting, northing)` in meters.
pub fn transform(x: f64, y: f64, from: CrsCode, to: CrsCode) -> Result<(f64, f64), ProjectionError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(ProjectionError::NonFinite { x, y });
    }

    match (from, to) {
        (CrsCode::Epsg4326, CrsCode::Epsg4326) | (CrsCode::Epsg3005, CrsCode::Epsg3005) => {
            Ok((x, y))
        }
        (CrsCode::Epsg4326, CrsCode::Epsg3005) => Ok(AlbersEqualArea::bc_albers().forward(x, y)),
        (CrsCode::Epsg3005, CrsCode::Epsg4326) => AlbersEqualArea::bc_albers()
            .inverse(x, y)
            .ok_or(ProjectionError::NoConvergence { x, y }),
    }
}

/// Transform a point and round both coordinates to six decimal places.
pub fn convert_coordinates(
    x: f64,
    y: f64,
    from: CrsCode,
    to: CrsCode,
) -> Result<(f64, f64), ProjectionError> {
    let (tx, ty) = transform(x, y, from, to)?;
    Ok((round6(tx), round6(ty)))
}
