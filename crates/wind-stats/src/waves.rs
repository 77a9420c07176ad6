//! Mean significant wave height (or any per-location variable) across
//! monthly text files.
//!
//! Each input file holds whitespace-delimited `lon lat value` rows for the
//! same set of locations. The per-location mean is written with BC Albers
//! coordinates to `<dir>/<variable>.csv`; an existing output is never
//! replaced.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use projection::transform;
use rei_common::{search_files, BoundingBox, CrsCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{WindStatsError, WindStatsResult};

/// One row of an input file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavePoint {
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
}

/// One row of the output table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub mean: f64,
    pub x: f64,
    pub y: f64,
}

/// Parse one whitespace-delimited `lon lat value` file. Blank lines are skipped.
pub fn load_wave_file(path: impl AsRef<Path>) -> WindStatsResult<Vec<WavePoint>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let mut points = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 3 {
            return Err(WindStatsError::InvalidFormat(format!(
                "{}:{}: expected 3 columns, found {}",
                path.display(),
                line_no + 1,
                fields.len()
            )));
        }
        let parse = |s: &str| {
            s.parse::<f64>().map_err(|_| {
                WindStatsError::InvalidFormat(format!(
                    "{}:{}: invalid number '{}'",
                    path.display(),
                    line_no + 1,
                    s
                ))
            })
        };
        points.push(WavePoint {
            longitude: parse(fields[0])?,
            latitude: parse(fields[1])?,
            value: parse(fields[2])?,
        });
    }

    debug!(path = %path.display(), rows = points.len(), "Loaded wave file");
    Ok(points)
}

/// Keep points inside `bbox` (bounds inclusive); x is longitude, y latitude.
pub fn subset(points: &[WavePoint], bbox: &BoundingBox) -> Vec<WavePoint> {
    points
        .iter()
        .filter(|p| bbox.contains_point(p.longitude, p.latitude))
        .copied()
        .collect()
}

/// Every dataset must have as many rows as the first.
pub fn check_shapes(datasets: &[(PathBuf, Vec<WavePoint>)]) -> WindStatsResult<()> {
    let Some((_, first)) = datasets.first() else {
        return Ok(());
    };
    for (file, points) in datasets {
        if points.len() != first.len() {
            return Err(WindStatsError::ShapeMismatch {
                file: file.clone(),
                expected: first.len(),
                actual: points.len(),
            });
        }
    }
    Ok(())
}

/// Row-wise mean across datasets, ignoring NaN values.
///
/// Coordinates come from the first dataset. Callers check shapes first.
pub fn mean_values(datasets: &[Vec<WavePoint>]) -> WindStatsResult<Vec<MeanPoint>> {
    let Some(first) = datasets.first() else {
        return Ok(Vec::new());
    };

    first
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let (sum, count) = datasets
                .iter()
                .filter_map(|d| d.get(i))
                .map(|q| q.value)
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            let mean = if count == 0 { f64::NAN } else { sum / count as f64 };
            let (x, y) = transform(p.longitude, p.latitude, CrsCode::Epsg4326, CrsCode::Epsg3005)?;
            Ok(MeanPoint {
                longitude: p.longitude,
                latitude: p.latitude,
                mean,
                x,
                y,
            })
        })
        .collect()
}

/// `<dir>/<variable>.csv`
pub fn output_path(dir: impl AsRef<Path>, variable: &str) -> PathBuf {
    dir.as_ref().join(format!("{}.csv", variable))
}

/// Write means with columns `longitude, latitude, mean_<variable>, x, y`.
///
/// Fails with [`WindStatsError::OutputExists`] rather than overwrite.
pub fn write_means(
    path: impl AsRef<Path>,
    variable: &str,
    points: &[MeanPoint],
) -> WindStatsResult<()> {
    let path = path.as_ref();
    let file: File = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => WindStatsError::OutputExists(path.to_path_buf()),
            _ => WindStatsError::Io(e),
        })?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(["longitude", "latitude", &format!("mean_{}", variable), "x", "y"])?;
    for p in points {
        writer.write_record([
            p.longitude.to_string(),
            p.latitude.to_string(),
            if p.mean.is_nan() { String::new() } else { p.mean.to_string() },
            p.x.to_string(),
            p.y.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Summary of a wave-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveMeans {
    pub output: PathBuf,
    pub files: usize,
    pub locations: usize,
}

/// Search, load, optionally subset, check, average and write.
pub fn process_wave_means(
    dir: impl AsRef<Path>,
    variable: &str,
    extension: &str,
    search: &str,
    coords: Option<&BoundingBox>,
) -> WindStatsResult<WaveMeans> {
    let dir = dir.as_ref();
    let output = output_path(dir, variable);
    if output.exists() {
        return Err(WindStatsError::OutputExists(output));
    }

    let files = search_files(dir, extension, search)?;
    info!(
        count = files.len(),
        dir = %dir.display(),
        search,
        extension,
        "Found input files"
    );
    if files.is_empty() {
        return Err(WindStatsError::NoFiles {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
            search: search.to_string(),
        });
    }

    let mut datasets = Vec::with_capacity(files.len());
    for file in files {
        let mut points = load_wave_file(&file)?;
        if let Some(bbox) = coords {
            points = subset(&points, bbox);
        }
        datasets.push((file, points));
    }
    match coords {
        Some(bbox) => info!(?bbox, "Subset data by coordinates"),
        None => info!("No coordinates provided, skipping subset"),
    }

    check_shapes(&datasets)?;
    let data: Vec<Vec<WavePoint>> = datasets.into_iter().map(|(_, p)| p).collect();
    let means = mean_values(&data)?;
    write_means(&output, variable, &means)?;

    info!(variable, output = %output.display(), locations = means.len(), "Wrote mean layer");
    Ok(WaveMeans {
        output,
        files: data.len(),
        locations: means.len(),
    })
}
