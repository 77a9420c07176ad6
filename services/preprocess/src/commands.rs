//! Subcommand implementations.

use std::path::Path;

use anyhow::{bail, Context, Result};
use interpolation::{interpolate_table, InterpolationReport, PointTable, SplineConfig};
use projection::convert_coordinates;
use rei_common::{lon360_bbox_string, BoundingBox, CrsCode};
use rei_grid::WritePolicy;
use tracing::info;
use wind_stats::{build_tables, process_wave_means, HrdpsTables, WaveMeans};

/// Build `freq_mxspd.csv` and `hrdps_<region>.csv` in `<data_dir>/<region>`.
pub fn hrdps_table(data_dir: &Path, region: &str, albers: bool) -> Result<HrdpsTables> {
    let region_dir = data_dir.join(region);
    let (grand_mean, frequency) = wind_stats::read_region(&region_dir)
        .with_context(|| format!("Failed to read HRDPS products in {}", region_dir.display()))?;

    info!(
        region,
        grand_mean = grand_mean.len(),
        frequency = frequency.len(),
        "Read HRDPS products"
    );
    let tables = build_tables(&grand_mean, &frequency, &region_dir, region, albers)?;
    Ok(tables)
}

/// Interpolate every statistic column of `table`.
///
/// Returns the report even when fields failed; the caller decides the exit
/// status.
pub fn interpolate(
    working_dir: &Path,
    table: &Path,
    config: &SplineConfig,
    policy: WritePolicy,
) -> Result<InterpolationReport> {
    let points = PointTable::from_csv(table)
        .with_context(|| format!("Failed to read point table {}", table.display()))?;
    info!(
        table = %table.display(),
        points = points.len(),
        fields = points.field_names().count(),
        "Loaded point table"
    );
    let report = interpolate_table(&points, working_dir, config, policy)?;
    Ok(report)
}

pub fn wave_means(
    dir: &Path,
    variable: &str,
    extension: &str,
    search: &str,
    coords: Option<&str>,
) -> Result<WaveMeans> {
    let bbox = coords
        .map(BoundingBox::from_lat_lon_string)
        .transpose()
        .context("Invalid --coords")?;
    let means = process_wave_means(dir, variable, extension, search, bbox.as_ref())?;
    Ok(means)
}

/// `lon1,lon2,lat1,lat2` on a 0-360 longitude axis.
pub fn bbox(sw_lon: f64, sw_lat: f64, ne_lon: f64, ne_lat: f64) -> Result<String> {
    if ![sw_lon, sw_lat, ne_lon, ne_lat].iter().all(|v| v.is_finite()) {
        bail!("coordinates must be finite");
    }
    Ok(lon360_bbox_string((sw_lon, sw_lat), (ne_lon, ne_lat)))
}

pub fn convert(x: f64, y: f64, from: CrsCode, to: CrsCode) -> Result<(f64, f64)> {
    let converted = convert_coordinates(x, y, from, to)
        .with_context(|| format!("Failed to convert ({}, {}) from {} to {}", x, y, from, to))?;
    Ok(converted)
}
