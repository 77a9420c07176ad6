//! Wind and wave statistics feeding the spline interpolation step.
//!
//! Two independent preprocessors live here:
//!
//! - [`hrdps`]: joins the HRDPS grand-mean maximum wind speed and direction
//!   frequency products into a long table and a wide
//!   `mx_spd_<dir>`/`freq_<dir>` table per location.
//! - [`waves`]: averages per-location wave statistics across monthly text
//!   files.
//!
//! Reading the HRDPS NetCDF products needs the `netcdf` feature (and the
//! system NetCDF/HDF5 libraries). Without it [`read_region`] reports
//! [`WindStatsError::NetCdfUnavailable`].

pub mod error;
pub mod hrdps;
#[cfg(feature = "netcdf")]
pub mod nc;
pub mod waves;

use std::path::Path;

pub use error::{WindStatsError, WindStatsResult};
pub use hrdps::{
    build_tables, lon360_to_180, merge, pivot_wide, FrequencyRecord, GrandMeanRecord,
    HrdpsTables, LongRecord, WideRow, WideTable,
};
pub use waves::{process_wave_means, MeanPoint, WaveMeans, WavePoint};

/// Read the grand-mean and frequency products from a region directory.
#[cfg(feature = "netcdf")]
pub fn read_region(
    region_dir: impl AsRef<Path>,
) -> WindStatsResult<(Vec<GrandMeanRecord>, Vec<FrequencyRecord>)> {
    nc::silence_hdf5_errors();
    nc::read_region(region_dir)
}

/// Read the grand-mean and frequency products from a region directory.
#[cfg(not(feature = "netcdf"))]
pub fn read_region(
    region_dir: impl AsRef<Path>,
) -> WindStatsResult<(Vec<GrandMeanRecord>, Vec<FrequencyRecord>)> {
    let _ = region_dir.as_ref();
    Err(WindStatsError::NetCdfUnavailable)
}
