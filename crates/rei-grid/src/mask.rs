//! Nodata masking.
//!
//! A [`MaskedGrid`] pairs a grid with a per-cell exclusion mask. Masked cells
//! never take part in arithmetic; combining two masked grids masks every cell
//! that is masked in either operand.

use crate::error::{GridError, Result};
use crate::types::{Grid, Nodata};

/// Summary statistics over the unmasked cells of a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskedStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid: usize,
}

/// A grid plus a boolean exclusion mask (`true` = no data).
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedGrid {
    grid: Grid,
    mask: Vec<bool>,
}

impl MaskedGrid {
    /// Mask every cell matching the sentinel.
    pub fn from_grid(grid: Grid, nodata: Nodata) -> Self {
        let mask = grid.data().iter().map(|&v| nodata.matches(v)).collect();
        Self { grid, mask }
    }

    /// A grid with nothing masked.
    pub fn unmasked(grid: Grid) -> Self {
        let mask = vec![false; grid.len()];
        Self { grid, mask }
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Raw cell values, including whatever sits under the mask.
    pub fn values(&self) -> &[f64] {
        self.grid.data()
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn is_masked(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(true)
    }

    /// Value at `(col, row)`, or `None` if masked or out of range.
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width() || row >= self.height() {
            return None;
        }
        let idx = row * self.width() + col;
        if self.mask[idx] {
            None
        } else {
            self.grid.data().get(idx).copied()
        }
    }

    pub fn masked_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn valid_count(&self) -> usize {
        self.len() - self.masked_count()
    }

    /// Apply `f` to every unmasked cell.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let data = self
            .grid
            .data()
            .iter()
            .zip(&self.mask)
            .map(|(&v, &m)| if m { v } else { f(v) })
            .collect();
        Self {
            grid: Grid::from_parts(data, self.width(), self.height()),
            mask: self.mask.clone(),
        }
    }

    /// Combine two co-shaped grids cell by cell.
    ///
    /// `f` only runs where both operands are unmasked; the result mask is the
    /// union of both masks.
    pub fn zip_with(&self, other: &MaskedGrid, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(GridError::DimensionMismatch {
                layer: "masked operand".to_string(),
                expected: self.shape(),
                actual: other.shape(),
            });
        }

        let mut data = Vec::with_capacity(self.len());
        let mut mask = Vec::with_capacity(self.len());
        for i in 0..self.len() {
            let masked = self.mask[i] || other.mask[i];
            mask.push(masked);
            data.push(if masked {
                self.grid.data()[i]
            } else {
                f(self.grid.data()[i], other.grid.data()[i])
            });
        }

        Ok(Self {
            grid: Grid::from_parts(data, self.width(), self.height()),
            mask,
        })
    }

    /// Additionally mask every unmasked cell where `pred` holds.
    ///
    /// Returns the number of newly masked cells.
    pub fn mask_where(&mut self, pred: impl Fn(f64) -> bool) -> usize {
        let mut added = 0;
        for (v, m) in self.grid.data().iter().zip(self.mask.iter_mut()) {
            if !*m && pred(*v) {
                *m = true;
                added += 1;
            }
        }
        added
    }

    /// Mask unmasked cells whose flat index satisfies `pred`. Returns how
    /// many were newly masked.
    pub fn mask_indices_where(&mut self, pred: impl Fn(usize) -> bool) -> usize {
        let mut added = 0;
        for (idx, m) in self.mask.iter_mut().enumerate() {
            if !*m && pred(idx) {
                *m = true;
                added += 1;
            }
        }
        added
    }

    /// Plain grid with masked cells replaced by `fill`.
    pub fn filled(&self, fill: f64) -> Grid {
        let data = self
            .grid
            .data()
            .iter()
            .zip(&self.mask)
            .map(|(&v, &m)| if m { fill } else { v })
            .collect();
        Grid::from_parts(data, self.width(), self.height())
    }

    /// Min/max/mean of the unmasked cells, `None` if everything is masked.
    pub fn stats(&self) -> Option<MaskedStats> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut valid = 0usize;

        for (&v, &m) in self.grid.data().iter().zip(&self.mask) {
            if m || !v.is_finite() {
                continue;
            }
            min = min.min(v);
            max = max.max(v);
            sum += v;
            valid += 1;
        }

        (valid > 0).then(|| MaskedStats {
            min,
            max,
            mean: sum / valid as f64,
            valid,
        })
    }
}
