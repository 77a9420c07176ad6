//! Coordinate Reference System codes used by the workflow.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReiError;

/// CRS codes the workflow reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// NAD83 / BC Albers (meters)
    Epsg3005,
}

impl CrsCode {
    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3005 => 3005,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    pub fn from_epsg(code: u32) -> Result<Self, ReiError> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            3005 => Ok(CrsCode::Epsg3005),
            other => Err(ReiError::UnsupportedCrs(format!("EPSG:{}", other))),
        }
    }
}

impl FromStr for CrsCode {
    type Err = ReiError;

    /// Accepts `"EPSG:3005"`, `"epsg:4326"` or a bare `"3005"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        let digits = normalized.strip_prefix("EPSG:").unwrap_or(&normalized);
        let code: u32 = digits
            .parse()
            .map_err(|_| ReiError::UnsupportedCrs(s.to_string()))?;
        Self::from_epsg(code)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}
