//! Synthetic raster generators for attenuation and interpolation tests.
//!
//! All generators return row-major `Vec<f64>` (row 0 first), matching the
//! layout of `rei_grid::Grid`.

/// Creates a grid with predictable values: `col * 1000 + row`.
///
/// Makes it easy to verify that cells survive a read/write cycle in place.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates a grid filled with a single value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// Creates a bathymetry-like depth grid in meters (positive down).
///
/// The first column is land (`-2.0`), depth then increases linearly
/// offshore by `slope_per_cell` meters per column.
pub fn create_depth_grid(width: usize, height: usize, slope_per_cell: f64) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            if col == 0 {
                data.push(-2.0);
            } else {
                data.push(col as f64 * slope_per_cell);
            }
        }
    }
    data
}

/// Creates an exposure (REI) grid with strictly positive values.
///
/// Values increase from the top-left corner, ranging over `(0, max]`.
pub fn create_exposure_grid(width: usize, height: usize, max: f64) -> Vec<f64> {
    let cells = (width * height).max(1) as f64;
    (0..width * height)
        .map(|i| max * (i as f64 + 1.0) / cells)
        .collect()
}

/// Copies `data` and replaces the given `(col, row)` cells with `nodata`.
pub fn with_nodata_cells(
    data: &[f64],
    width: usize,
    cells: &[(usize, usize)],
    nodata: f64,
) -> Vec<f64> {
    let mut out = data.to_vec();
    for &(col, row) in cells {
        out[row * width + col] = nodata;
    }
    out
}

/// Scattered sample points `(x, y, value)` drawn from a smooth plane
/// `value = a + b*x + c*y`, laid out on a jittered lattice.
pub fn create_plane_samples(
    count_x: usize,
    count_y: usize,
    spacing: f64,
    coefficients: (f64, f64, f64),
) -> Vec<(f64, f64, f64)> {
    let (a, b, c) = coefficients;
    let mut samples = Vec::with_capacity(count_x * count_y);
    for j in 0..count_y {
        for i in 0..count_x {
            // Deterministic jitter keeps the points non-collinear.
            let jitter = ((i * 7 + j * 13) % 5) as f64 * 0.05 * spacing;
            let x = i as f64 * spacing + jitter;
            let y = j as f64 * spacing - jitter;
            samples.push((x, y, a + b * x + c * y));
        }
    }
    samples
}
