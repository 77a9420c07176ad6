//! HRDPS NetCDF product reader.
//!
//! Both products carry `nav_lat` / `nav_lon` on the horizontal grid. Data
//! variables are laid out with the horizontal dimensions last, so flat index
//! `i` belongs to location `i % locations`:
//!
//! - grand mean: `max_wind_spd` and `wind_dir_binned`, same shape
//! - frequency: `freq_total(bin, ...)` with a `bin` coordinate variable

use std::path::Path;
use std::sync::Once;

use tracing::debug;

use crate::error::{WindStatsError, WindStatsResult};
use crate::hrdps::{FrequencyRecord, GrandMeanRecord, FREQUENCY_FILE, GRAND_MEAN_FILE};

/// Silence HDF5's automatic error printing to stderr.
///
/// HDF5 reports handled lookups of optional attributes as errors. Call once
/// before opening any file; later calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe; null handlers disable output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

fn open(path: &Path) -> WindStatsResult<netcdf::File> {
    if !path.exists() {
        return Err(WindStatsError::MissingData(path.display().to_string()));
    }
    netcdf::open(path).map_err(|e| {
        WindStatsError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })
}

/// Read a variable as f64, turning `_FillValue` cells into NaN.
fn read_f64(file: &netcdf::File, name: &str) -> WindStatsResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| WindStatsError::MissingData(format!("{} variable", name)))?;
    let values: Vec<f64> = var
        .get_values(..)
        .map_err(|e| WindStatsError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;
    let fill = get_f64_attr(&var, "_FillValue");
    Ok(values
        .into_iter()
        .map(|v| if Some(v) == fill { f64::NAN } else { v })
        .collect())
}

fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn read_locations(file: &netcdf::File) -> WindStatsResult<(Vec<f64>, Vec<f64>)> {
    let lat = read_f64(file, "nav_lat")?;
    let lon = read_f64(file, "nav_lon")?;
    if lat.len() != lon.len() || lat.is_empty() {
        return Err(WindStatsError::InvalidFormat(format!(
            "nav_lat has {} values, nav_lon has {}",
            lat.len(),
            lon.len()
        )));
    }
    Ok((lat, lon))
}

fn check_multiple(name: &str, len: usize, locations: usize) -> WindStatsResult<()> {
    if len % locations != 0 {
        return Err(WindStatsError::InvalidFormat(format!(
            "{} has {} values, not a multiple of {} locations",
            name, len, locations
        )));
    }
    Ok(())
}

/// Read `HRDPS_OPPwest_ps2.5km_grandmean.nc`. Records with a NaN direction are dropped.
pub fn read_grand_mean(path: impl AsRef<Path>) -> WindStatsResult<Vec<GrandMeanRecord>> {
    silence_hdf5_errors();
    let file = open(path.as_ref())?;
    let (lat, lon) = read_locations(&file)?;
    let speed = read_f64(&file, "max_wind_spd")?;
    let direction = read_f64(&file, "wind_dir_binned")?;

    if speed.len() != direction.len() {
        return Err(WindStatsError::InvalidFormat(
            "max_wind_spd and wind_dir_binned differ in shape".to_string(),
        ));
    }
    check_multiple("max_wind_spd", speed.len(), lat.len())?;

    let records: Vec<GrandMeanRecord> = speed
        .iter()
        .zip(&direction)
        .enumerate()
        .filter(|(_, (_, d))| !d.is_nan())
        .map(|(i, (&s, &d))| GrandMeanRecord {
            lat: lat[i % lat.len()],
            lon: lon[i % lon.len()],
            direction: d,
            max_wind_spd: s,
        })
        .collect();

    debug!(path = %path.as_ref().display(), records = records.len(), "Read grand mean");
    Ok(records)
}

/// Read `HRDPS_OPPwest_ps2.5km_frequency.nc`.
pub fn read_frequency(path: impl AsRef<Path>) -> WindStatsResult<Vec<FrequencyRecord>> {
    silence_hdf5_errors();
    let file = open(path.as_ref())?;
    let (lat, lon) = read_locations(&file)?;
    let bins = read_f64(&file, "bin")?;
    let freq = read_f64(&file, "freq_total")?;

    if freq.len() != bins.len() * lat.len() {
        return Err(WindStatsError::InvalidFormat(format!(
            "freq_total has {} values, expected {} bins x {} locations",
            freq.len(),
            bins.len(),
            lat.len()
        )));
    }

    let records: Vec<FrequencyRecord> = freq
        .iter()
        .enumerate()
        .map(|(i, &f)| FrequencyRecord {
            lat: lat[i % lat.len()],
            lon: lon[i % lon.len()],
            direction: bins[i / lat.len()],
            freq: f,
        })
        .collect();

    debug!(path = %path.as_ref().display(), records = records.len(), "Read frequency");
    Ok(records)
}

/// Read both products from a region directory.
pub fn read_region(
    region_dir: impl AsRef<Path>,
) -> WindStatsResult<(Vec<GrandMeanRecord>, Vec<FrequencyRecord>)> {
    let dir = region_dir.as_ref();
    Ok((
        read_grand_mean(dir.join(GRAND_MEAN_FILE))?,
        read_frequency(dir.join(FREQUENCY_FILE))?,
    ))
}
