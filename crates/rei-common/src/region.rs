//! Study regions and model versions used to tag REI outputs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReiError;

/// Coastal study region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Strait of Georgia
    Sog,
    /// Queen Charlotte Strait
    Qcs,
    /// North Central Coast
    Ncc,
    /// West Coast Vancouver Island
    Wcvi,
    /// Haida Gwaii
    Hg,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Sog,
        Region::Qcs,
        Region::Ncc,
        Region::Wcvi,
        Region::Hg,
    ];

    /// Short code used in file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Sog => "sog",
            Region::Qcs => "qcs",
            Region::Ncc => "ncc",
            Region::Wcvi => "wcvi",
            Region::Hg => "hg",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ReiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sog" => Ok(Region::Sog),
            "qcs" => Ok(Region::Qcs),
            "ncc" => Ok(Region::Ncc),
            "wcvi" => Ok(Region::Wcvi),
            "hg" => Ok(Region::Hg),
            _ => Err(ReiError::InvalidRegion(s.to_string())),
        }
    }
}

/// Model version tag, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelVersion(u8);

impl ModelVersion {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(version: u8) -> Result<Self, ReiError> {
        if (Self::MIN..=Self::MAX).contains(&version) {
            Ok(Self(version))
        } else {
            Err(ReiError::InvalidVersion(version.to_string()))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModelVersion {
    type Err = ReiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version: u8 = s
            .trim()
            .parse()
            .map_err(|_| ReiError::InvalidVersion(s.to_string()))?;
        Self::new(version)
    }
}

/// File name of an attenuated REI raster: `rei_{region}_{version}.tif`.
pub fn output_file_name(region: Region, version: ModelVersion) -> String {
    format!("rei_{}_{}.tif", region, version)
}
