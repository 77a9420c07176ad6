//! CDS request configuration.
//!
//! Loaded from a YAML file (`config/cds.yaml` by default). Credentials may
//! also come from `CDSAPI_URL` / `CDSAPI_KEY`, which take precedence.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rei_common::BoundingBox;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const URL_ENV: &str = "CDSAPI_URL";
pub const KEY_ENV: &str = "CDSAPI_KEY";

/// One reanalysis download, split into one request per year.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CdsRequest {
    /// Dataset short name, e.g. `reanalysis-era5-single-levels`
    pub dataset: String,
    #[serde(default = "default_product_type")]
    pub product_type: String,
    pub variables: Vec<String>,
    /// Prefix of the output file names, e.g. `u10_v10`
    pub vars_shorthand: String,
    pub years: YearRange,
    #[serde(default = "default_months")]
    pub months: Vec<String>,
    #[serde(default = "default_days")]
    pub days: Vec<String>,
    #[serde(default = "default_hours")]
    pub hours: Vec<String>,
    /// Area as `north/west/south/east`
    pub area: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct YearRange {
    pub start: u16,
    pub end: u16,
}

fn default_product_type() -> String {
    "reanalysis".to_string()
}

fn default_months() -> Vec<String> {
    (1..=12).map(|m| format!("{:02}", m)).collect()
}

fn default_days() -> Vec<String> {
    (1..=31).map(|d| format!("{:02}", d)).collect()
}

fn default_hours() -> Vec<String> {
    (0..24).map(|h| format!("{:02}:00", h)).collect()
}

fn default_format() -> String {
    "netcdf".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/era5")
}

fn default_url() -> String {
    "https://cds.climate.copernicus.eu/api".to_string()
}

impl CdsRequest {
    /// Load a request from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let request: CdsRequest = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(dataset = %request.dataset, path = %path.display(), "Loaded CDS request");
        Ok(request)
    }

    /// Override url and key from the given environment values.
    pub fn apply_credentials(&mut self, url: Option<String>, key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.url = url;
        }
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            self.key = Some(key);
        }
    }

    /// [`apply_credentials`](Self::apply_credentials) from `CDSAPI_URL` / `CDSAPI_KEY`.
    pub fn apply_env(&mut self) {
        self.apply_credentials(std::env::var(URL_ENV).ok(), std::env::var(KEY_ENV).ok());
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            bail!("dataset must not be empty");
        }
        if self.variables.is_empty() {
            bail!("at least one variable is required");
        }
        if self.vars_shorthand.trim().is_empty() {
            bail!("vars_shorthand must not be empty");
        }
        if self.years.start > self.years.end {
            bail!(
                "year range is reversed: {} > {}",
                self.years.start,
                self.years.end
            );
        }
        if self.months.is_empty() || self.days.is_empty() || self.hours.is_empty() {
            bail!("months, days and hours must not be empty");
        }
        BoundingBox::from_cds_area(&self.area)
            .with_context(|| format!("invalid area '{}'", self.area))?;
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            bail!("url must be http(s): {}", self.url);
        }
        Ok(())
    }

    pub fn years(&self) -> RangeInclusive<u16> {
        self.years.start..=self.years.end
    }

    /// `{vars_shorthand}_hourly_era5_{year}.nc`
    pub fn file_name(&self, year: u16) -> String {
        format!("{}_hourly_era5_{}.nc", self.vars_shorthand, year)
    }

    pub fn output_path(&self, year: u16) -> PathBuf {
        self.output_dir.join(self.file_name(year))
    }

    /// Key required for submitting jobs.
    pub fn api_key(&self) -> Result<&str> {
        self.key
            .as_deref()
            .filter(|k| !k.is_empty())
            .with_context(|| format!("no CDS API key; set `key` in the config or {}", KEY_ENV))
    }

    /// Process inputs for one year, as posted to the retrieve API.
    pub fn inputs(&self, year: u16) -> serde_json::Value {
        serde_json::json!({
            "product_type": [self.product_type],
            "variable": self.variables,
            "year": [year.to_string()],
            "month": self.months,
            "day": self.days,
            "time": self.hours,
            "data_format": self.format,
            "area": self.area_values(),
        })
    }

    fn area_values(&self) -> Vec<f64> {
        self.area
            .split('/')
            .filter_map(|v| v.trim().parse().ok())
            .collect()
    }
}
