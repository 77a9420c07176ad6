//! Per-field interpolation with a collected report.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rei_grid::{write_layer, GeoProfile, Grid, WritePolicy};
use tracing::{info, warn};

use crate::config::SplineConfig;
use crate::error::{InterpolationError, Result};
use crate::raster::{rasterize, OutputGrid};
use crate::spline::RegularizedSpline;
use crate::table::PointTable;

/// Sub-directory of the working directory receiving spline rasters.
pub const SPLINE_DIR: &str = "spline_hrdps";

/// `<field>_spline.tif`
pub fn spline_file_name(field: &str) -> String {
    format!("{}_spline.tif", field)
}

/// Outcome of one field.
#[derive(Debug)]
pub struct FieldOutcome {
    pub field: String,
    pub points: usize,
    pub result: Result<PathBuf>,
}

/// Outcomes of every field in a run.
#[derive(Debug, Default)]
pub struct InterpolationReport {
    pub outcomes: Vec<FieldOutcome>,
}

impl InterpolationReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &InterpolationError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.field.as_str(), e)))
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

impl fmt::Display for InterpolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} fields failed", self.failed_count(), self.total())?;
        for (field, err) in self.failures() {
            write!(f, "\n  {}: {}", field, err)?;
        }
        Ok(())
    }
}

/// Fit and rasterize one field of the table.
pub fn interpolate_field(
    table: &PointTable,
    field: &str,
    config: &SplineConfig,
) -> Result<(Grid, GeoProfile)> {
    let points = table
        .points(field)
        .ok_or_else(|| InterpolationError::MissingColumn(field.to_string()))?;
    if points.len() > config.max_points {
        return Err(InterpolationError::TooManyPoints {
            count: points.len(),
            max: config.max_points,
        });
    }

    let spline = RegularizedSpline::fit(&points, config.weight)?;
    let layout = OutputGrid::covering(&points, config.cell_size);
    let grid = rasterize(&spline, &layout, config.nodata)?;
    Ok((grid, layout.profile(config.nodata)))
}

/// Interpolate every statistic column of `table` into
/// `<working_dir>/spline_hrdps/<field>_spline.tif`.
///
/// Only setup failures (bad config, output directory) are returned as
/// errors; per-field failures are recorded in the report.
pub fn interpolate_table(
    table: &PointTable,
    working_dir: impl AsRef<Path>,
    config: &SplineConfig,
    policy: WritePolicy,
) -> Result<InterpolationReport> {
    config.validate().map_err(InterpolationError::InvalidConfig)?;

    let out_dir = working_dir.as_ref().join(SPLINE_DIR);
    if !out_dir.is_dir() {
        info!(dir = %out_dir.display(), "Creating output folder");
        fs::create_dir_all(&out_dir)?;
    }

    let mut report = InterpolationReport::default();
    for field in table.field_names() {
        let points = table.points(field).map_or(0, |p| p.len());
        let output = out_dir.join(spline_file_name(field));

        let result = interpolate_field(table, field, config).and_then(|(grid, profile)| {
            write_layer(&output, &grid, &profile, policy)?;
            Ok(output)
        });

        match &result {
            Ok(path) => info!(field, points, output = %path.display(), "Interpolated field"),
            Err(e) => warn!(field, points, error = %e, "Field interpolation failed"),
        }

        report.outcomes.push(FieldOutcome {
            field: field.to_string(),
            points,
            result,
        });
    }

    info!(
        total = report.total(),
        failed = report.failed_count(),
        "Interpolation complete"
    );
    Ok(report)
}
