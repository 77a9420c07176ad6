//! Output raster layout and parallel surface evaluation.

use rayon::prelude::*;
use rei_common::CrsCode;
use rei_grid::{GeoKeys, GeoProfile, GeoTransform, Grid, Nodata, SampleFormat};

use crate::error::Result;
use crate::spline::RegularizedSpline;

/// A north-up raster covering a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGrid {
    /// Model x of the top-left corner.
    pub origin_x: f64,
    /// Model y of the top-left corner.
    pub origin_y: f64,
    pub cell_size: f64,
    pub width: usize,
    pub height: usize,
}

impl OutputGrid {
    /// Smallest grid of `cell_size` cells whose extent covers every point.
    pub fn covering(points: &[(f64, f64, f64)], cell_size: f64) -> Self {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &(x, y, _) in points {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        if points.is_empty() {
            (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
        }

        let width = ((max_x - min_x) / cell_size).ceil().max(1.0) as usize;
        let height = ((max_y - min_y) / cell_size).ceil().max(1.0) as usize;
        Self {
            origin_x: min_x,
            origin_y: max_y,
            cell_size,
            width,
            height,
        }
    }

    /// Model coordinates of the center of `(col, row)`.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.cell_size,
            self.origin_y - (row as f64 + 0.5) * self.cell_size,
        )
    }

    /// Georeferencing profile in BC Albers.
    pub fn profile(&self, nodata: f64) -> GeoProfile {
        GeoProfile {
            width: self.width,
            height: self.height,
            band_count: 1,
            sample_format: SampleFormat::Float32,
            transform: GeoTransform::from_origin(
                self.origin_x,
                self.origin_y,
                self.cell_size,
                self.cell_size,
            ),
            geo_keys: GeoKeys::projected(CrsCode::Epsg3005.epsg() as u16),
            nodata: Nodata::Value(nodata),
        }
    }
}

/// Evaluate `spline` at every cell center, one row per task.
///
/// Non-finite results are written as `nodata`.
pub fn rasterize(spline: &RegularizedSpline, grid: &OutputGrid, nodata: f64) -> Result<Grid> {
    let mut data = vec![nodata; grid.width * grid.height];
    data.par_chunks_mut(grid.width)
        .enumerate()
        .for_each(|(row, cells)| {
            for (col, cell) in cells.iter_mut().enumerate() {
                let (x, y) = grid.cell_center(col, row);
                let value = spline.evaluate(x, y);
                *cell = if value.is_finite() { value } else { nodata };
            }
        });
    Ok(Grid::new(data, grid.width, grid.height)?)
}
