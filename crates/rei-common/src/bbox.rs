//! Bounding box types and the string formats used by the workflow.
//!
//! Three encodings show up across the pipeline:
//! - CDS `area` requests: `"N/W/S/E"` in degrees
//! - subset arguments: `"lat_min lat_max lon_min lon_max"` (space separated)
//! - 0-360 longitude strings: `"lon1,lon2,lat1,lat2"` for grids stored on a 0-360 axis

use serde::{Deserialize, Serialize};

use crate::error::{ReiError, ReiResult};

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), x is longitude and y is latitude in degrees.
/// For BC Albers (EPSG:3005), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a CDS area string: `"north/west/south/east"`.
    pub fn from_cds_area(s: &str) -> ReiResult<Self> {
        let values = parse_numbers(s, '/', 4)?;
        let (north, west, south, east) = (values[0], values[1], values[2], values[3]);
        let bbox = Self::new(west, south, east, north);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Parse a space-delimited subset string: `"lat_min lat_max lon_min lon_max"`.
    pub fn from_lat_lon_string(s: &str) -> ReiResult<Self> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() != 4 {
            return Err(ReiError::InvalidBbox(format!(
                "{}. Expected 'lat_min lat_max lon_min lon_max'",
                s
            )));
        }
        let mut values = [0.0; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| ReiError::InvalidNumber(part.to_string()))?;
        }
        let bbox = Self::new(values[2], values[0], values[3], values[1]);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Format as a CDS area string: `"north/west/south/east"`.
    pub fn to_cds_area(&self) -> String {
        format!("{}/{}/{}/{}", self.max_y, self.min_x, self.min_y, self.max_x)
    }

    /// Reject inverted or non-finite boxes.
    pub fn validate(&self) -> ReiResult<()> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ReiError::InvalidBbox(format!("non-finite corner in {:?}", self)));
        }
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(ReiError::InvalidBbox(format!(
                "minimum exceeds maximum in {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Build a `"lon1,lon2,lat1,lat2"` string on a 0-360 longitude axis from
/// southwest and northeast `(lon, lat)` corners.
///
/// Negative longitudes are shifted by 360. If that leaves the corners out of
/// order, both pairs are swapped so `lon1` is the westernmost.
pub fn lon360_bbox_string(sw: (f64, f64), ne: (f64, f64)) -> String {
    let (mut lon1, mut lat1) = sw;
    let (mut lon2, mut lat2) = ne;
    if lon1 < 0.0 {
        lon1 += 360.0;
    }
    if lon2 < 0.0 {
        lon2 += 360.0;
    }
    if lon1 > lon2 {
        std::mem::swap(&mut lon1, &mut lon2);
        std::mem::swap(&mut lat1, &mut lat2);
    }
    format!(
        "{},{},{},{}",
        round6(lon1),
        round6(lon2),
        round6(lat1),
        round6(lat2)
    )
}

/// Round to six decimal places.
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn parse_numbers(s: &str, sep: char, expected: usize) -> ReiResult<Vec<f64>> {
    let parts: Vec<&str> = s.split(sep).map(str::trim).collect();
    if parts.len() != expected {
        return Err(ReiError::InvalidBbox(s.to_string()));
    }
    parts
        .iter()
        .map(|p| {
            p.parse::<f64>()
                .map_err(|_| ReiError::InvalidNumber(p.to_string()))
        })
        .collect()
}
