//! HRDPS wind statistics: merge per-direction grand means with direction
//! frequencies, then pivot to one row per location.
//!
//! Source products are on a 0-360 longitude grid; output tables use
//! longitudes in -180..180.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use projection::transform;
use rei_common::CrsCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::WindStatsResult;

/// Grand-mean product file inside a region directory.
pub const GRAND_MEAN_FILE: &str = "HRDPS_OPPwest_ps2.5km_grandmean.nc";
/// Direction-frequency product file inside a region directory.
pub const FREQUENCY_FILE: &str = "HRDPS_OPPwest_ps2.5km_frequency.nc";
/// Long-format output table.
pub const LONG_TABLE_FILE: &str = "freq_mxspd.csv";

/// `hrdps_<region>.csv`
pub fn wide_table_file(region: &str) -> String {
    format!("hrdps_{}.csv", region)
}

/// Mean of monthly maximum wind speed for one location and direction bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrandMeanRecord {
    pub lat: f64,
    /// Longitude on the 0-360 grid.
    pub lon: f64,
    pub direction: f64,
    pub max_wind_spd: f64,
}

/// Fraction of winds falling in one direction bin at one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRecord {
    pub lat: f64,
    /// Longitude on the 0-360 grid.
    pub lon: f64,
    pub direction: f64,
    pub freq: f64,
}

/// One row of `freq_mxspd.csv`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub lat_dd: f64,
    pub lon_dd: f64,
    pub direction: f64,
    pub mx_spd: f64,
    pub freq: f64,
}

/// One location of the wide table; values are indexed like
/// [`WideTable::directions`], NaN where a bin is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub lat_dd: f64,
    pub lon_dd: f64,
    pub mx_spd: Vec<f64>,
    pub freq: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideTable {
    /// Direction bins, ascending.
    pub directions: Vec<i64>,
    /// Rows sorted by latitude then longitude.
    pub rows: Vec<WideRow>,
}

/// Convert a 0-360 longitude to the -180..180 range.
pub fn lon360_to_180(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

type Key = (u64, u64, u64);

fn key(lat: f64, lon: f64, direction: f64) -> Key {
    (lat.to_bits(), lon.to_bits(), direction.to_bits())
}

/// Inner join on (lat, lon, direction).
///
/// Output order follows the grand-mean records. NaN values are kept.
pub fn merge(grand_mean: &[GrandMeanRecord], frequency: &[FrequencyRecord]) -> Vec<LongRecord> {
    let freq_by_key: HashMap<Key, f64> = frequency
        .iter()
        .map(|r| (key(r.lat, r.lon, r.direction), r.freq))
        .collect();

    let merged: Vec<LongRecord> = grand_mean
        .iter()
        .filter_map(|gm| {
            let freq = *freq_by_key.get(&key(gm.lat, gm.lon, gm.direction))?;
            Some(LongRecord {
                lat_dd: gm.lat,
                lon_dd: lon360_to_180(gm.lon),
                direction: gm.direction,
                mx_spd: gm.max_wind_spd,
                freq,
            })
        })
        .collect();

    debug!(
        grand_mean = grand_mean.len(),
        frequency = frequency.len(),
        merged = merged.len(),
        "Merged HRDPS records"
    );
    merged
}

/// Ordered wrapper so f64 coordinates can key a `BTreeMap`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Coord(f64);

impl Eq for Coord {}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Pivot long records to one row per (lat, lon) with a column per direction.
pub fn pivot_wide(records: &[LongRecord]) -> WideTable {
    let directions: Vec<i64> = records
        .iter()
        .map(|r| r.direction as i64)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let column: HashMap<i64, usize> = directions
        .iter()
        .enumerate()
        .map(|(i, &d)| (d, i))
        .collect();

    let mut rows: BTreeMap<(Coord, Coord), WideRow> = BTreeMap::new();
    for r in records {
        let row = rows
            .entry((Coord(r.lat_dd), Coord(r.lon_dd)))
            .or_insert_with(|| WideRow {
                lat_dd: r.lat_dd,
                lon_dd: r.lon_dd,
                mx_spd: vec![f64::NAN; directions.len()],
                freq: vec![f64::NAN; directions.len()],
            });
        if let Some(&i) = column.get(&(r.direction as i64)) {
            row.mx_spd[i] = r.mx_spd;
            row.freq[i] = r.freq;
        }
    }

    WideTable {
        directions,
        rows: rows.into_values().collect(),
    }
}

impl WideTable {
    /// Column names: `lat_dd, lon_dd, mx_spd_<dir>..., freq_<dir>...`
    /// followed by `x, y` when `with_albers` is set.
    pub fn headers(&self, with_albers: bool) -> Vec<String> {
        let mut headers = vec!["lat_dd".to_string(), "lon_dd".to_string()];
        headers.extend(self.directions.iter().map(|d| format!("mx_spd_{}", d)));
        headers.extend(self.directions.iter().map(|d| format!("freq_{}", d)));
        if with_albers {
            headers.push("x".to_string());
            headers.push("y".to_string());
        }
        headers
    }

    pub fn write_csv(&self, path: impl AsRef<Path>, with_albers: bool) -> WindStatsResult<()> {
        let mut writer = csv::Writer::from_writer(File::create(path.as_ref())?);
        writer.write_record(self.headers(with_albers))?;

        for row in &self.rows {
            let mut record = vec![format_value(row.lat_dd), format_value(row.lon_dd)];
            record.extend(row.mx_spd.iter().copied().map(format_value));
            record.extend(row.freq.iter().copied().map(format_value));
            if with_albers {
                let (x, y) = transform(row.lon_dd, row.lat_dd, CrsCode::Epsg4326, CrsCode::Epsg3005)?;
                record.push(format_value(x));
                record.push(format_value(y));
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// NaN is written as an empty cell.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

pub fn write_long_csv(path: impl AsRef<Path>, records: &[LongRecord]) -> WindStatsResult<()> {
    let mut writer = csv::Writer::from_writer(File::create(path.as_ref())?);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Paths written by [`build_tables`].
#[derive(Debug, Clone, PartialEq)]
pub struct HrdpsTables {
    pub long_table: PathBuf,
    pub wide_table: PathBuf,
    pub locations: usize,
    pub directions: usize,
}

/// Merge, pivot and write both tables into `out_dir`.
pub fn build_tables(
    grand_mean: &[GrandMeanRecord],
    frequency: &[FrequencyRecord],
    out_dir: impl AsRef<Path>,
    region: &str,
    with_albers: bool,
) -> WindStatsResult<HrdpsTables> {
    let out_dir = out_dir.as_ref();
    let long = merge(grand_mean, frequency);
    let long_table = out_dir.join(LONG_TABLE_FILE);
    write_long_csv(&long_table, &long)?;

    let wide = pivot_wide(&long);
    let wide_table = out_dir.join(wide_table_file(region));
    wide.write_csv(&wide_table, with_albers)?;

    info!(
        region,
        locations = wide.rows.len(),
        directions = wide.directions.len(),
        long = %long_table.display(),
        wide = %wide_table.display(),
        "Wrote HRDPS tables"
    );

    Ok(HrdpsTables {
        long_table,
        wide_table,
        locations: wide.rows.len(),
        directions: wide.directions.len(),
    })
}
