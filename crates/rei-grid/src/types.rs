//! Core types: grids, nodata sentinels and georeferencing profiles.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// A single-band raster held in memory.
///
/// Values are stored row-major (row 0 is the top of the raster) as `f64`
/// regardless of the on-disk sample type.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Vec<f64>,
    width: usize,
    height: usize,
}

impl Grid {
    /// Create a grid, checking that `data` holds exactly `width * height` cells.
    pub fn new(data: Vec<f64>, width: usize, height: usize) -> Result<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(GridError::BadLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Internal constructor for data whose length is already known to match.
    pub(crate) fn from_parts(data: Vec<f64>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    /// Create a grid where every cell holds `value`.
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Create a grid by evaluating `f(col, row)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(col, row));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the value at a specific grid coordinate.
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }
}

/// The "no data" sentinel of a raster band.
///
/// Matching is exact equality, except that a NaN sentinel matches NaN
/// cells (NaN never compares equal to itself).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum Nodata {
    /// The band declares no sentinel; no cell is ever masked.
    #[default]
    None,
    /// Cells equal to this value carry no data.
    Value(f64),
}

impl Nodata {
    /// Whether `value` is the sentinel.
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Nodata::None => false,
            Nodata::Value(sentinel) if sentinel.is_nan() => value.is_nan(),
            Nodata::Value(sentinel) => value == sentinel,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match *self {
            Nodata::None => None,
            Nodata::Value(v) => Some(v),
        }
    }

    /// The sentinel, or `fallback` when the band has none.
    pub fn value_or(&self, fallback: f64) -> f64 {
        self.value().unwrap_or(fallback)
    }

    /// Parse the ASCII payload of a GDAL_NODATA tag.
    pub fn from_gdal_str(s: &str) -> Result<Self> {
        let trimmed = s.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        if trimmed.is_empty() {
            return Ok(Nodata::None);
        }
        trimmed
            .parse::<f64>()
            .map(Nodata::Value)
            .map_err(|_| GridError::InvalidNodata(trimmed.to_string()))
    }

    /// The sentinel as it reads back from a Float32 band.
    ///
    /// GDAL_NODATA is text, and text such as `-3.40282346639e+038` is not
    /// exactly representable in f32. Cells and sentinel must go through the
    /// same cast to compare equal.
    pub fn to_f32_precision(&self) -> Self {
        match *self {
            Nodata::None => Nodata::None,
            Nodata::Value(v) => Nodata::Value(v as f32 as f64),
        }
    }

    /// Format for a GDAL_NODATA tag.
    pub fn to_gdal_string(&self) -> Option<String> {
        self.value().map(|v| {
            if v.is_nan() {
                "nan".to_string()
            } else {
                format!("{}", v)
            }
        })
    }
}

impl PartialEq for Nodata {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Nodata::None, Nodata::None) => true,
            (Nodata::Value(a), Nodata::Value(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => false,
        }
    }
}

/// On-disk sample type of the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 32-bit float. Integer inputs are also written back as Float32.
    #[default]
    Float32,
    /// 64-bit float.
    Float64,
}

/// Raster-to-model transform as stored in GeoTIFF tags.
///
/// Either a pixel scale plus tiepoint(s), or a full 4x4 transformation
/// matrix. The raw tag values are kept so they can be written back
/// unmodified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// ModelPixelScaleTag: `[sx, sy, sz]`
    pub pixel_scale: Option<Vec<f64>>,
    /// ModelTiepointTag: `[i, j, k, x, y, z, ...]`
    pub tiepoints: Option<Vec<f64>>,
    /// ModelTransformationTag: 16 values, row-major 4x4
    pub transformation: Option<Vec<f64>>,
}

impl GeoTransform {
    /// Build from a north-up origin and cell size.
    pub fn from_origin(origin_x: f64, origin_y: f64, cell_width: f64, cell_height: f64) -> Self {
        Self {
            pixel_scale: Some(vec![cell_width, cell_height, 0.0]),
            tiepoints: Some(vec![0.0, 0.0, 0.0, origin_x, origin_y, 0.0]),
            transformation: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_scale.is_none() && self.tiepoints.is_none() && self.transformation.is_none()
    }

    /// GDAL-style affine coefficients
    /// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    ///
    /// `pixel_height` is negative for north-up rasters.
    pub fn affine(&self) -> Option<[f64; 6]> {
        if let Some(m) = self.transformation.as_deref().filter(|m| m.len() >= 8) {
            return Some([m[3], m[0], m[1], m[7], m[4], m[5]]);
        }
        let scale = self.pixel_scale.as_deref().filter(|s| s.len() >= 2)?;
        let tie = self.tiepoints.as_deref().filter(|t| t.len() >= 6)?;
        let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
        let origin_x = x - i * scale[0];
        let origin_y = y + j * scale[1];
        Some([origin_x, scale[0], 0.0, origin_y, 0.0, -scale[1]])
    }

    /// Model coordinates of the center of cell `(col, row)`.
    pub fn cell_center(&self, col: usize, row: usize) -> Option<(f64, f64)> {
        let [ox, pw, rr, oy, cr, ph] = self.affine()?;
        let c = col as f64 + 0.5;
        let r = row as f64 + 0.5;
        Some((ox + c * pw + r * rr, oy + c * cr + r * ph))
    }
}

/// GeoKey directory and parameter tags describing the spatial reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoKeys {
    /// GeoKeyDirectoryTag
    pub directory: Option<Vec<u16>>,
    /// GeoDoubleParamsTag
    pub double_params: Option<Vec<f64>>,
    /// GeoAsciiParamsTag
    pub ascii_params: Option<String>,
}

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

impl GeoKeys {
    /// Key directory for a projected CRS given by EPSG code.
    pub fn projected(epsg: u16) -> Self {
        Self::with_crs_key(1, PROJECTED_CS_TYPE, epsg)
    }

    /// Key directory for a geographic CRS given by EPSG code.
    pub fn geographic(epsg: u16) -> Self {
        Self::with_crs_key(2, GEOGRAPHIC_TYPE, epsg)
    }

    fn with_crs_key(model_type: u16, key: u16, epsg: u16) -> Self {
        Self {
            directory: Some(vec![
                1, 1, 0, 3, // version 1.1.0, three keys
                GT_MODEL_TYPE, 0, 1, model_type,
                GT_RASTER_TYPE, 0, 1, 1, // PixelIsArea
                key, 0, 1, epsg,
            ]),
            double_params: None,
            ascii_params: None,
        }
    }

    /// EPSG code of the projected or geographic CRS, if declared inline.
    pub fn epsg(&self) -> Option<u16> {
        let dir = self.directory.as_deref()?;
        let count = usize::from(*dir.get(3)?);
        dir.get(4..4 + count * 4)?
            .chunks_exact(4)
            .find(|entry| {
                (entry[0] == PROJECTED_CS_TYPE || entry[0] == GEOGRAPHIC_TYPE) && entry[1] == 0
            })
            .map(|entry| entry[3])
    }
}

/// Everything needed to write a raster that lines up with an input layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoProfile {
    pub width: usize,
    pub height: usize,
    /// Samples per pixel in the source file.
    pub band_count: u16,
    pub sample_format: SampleFormat,
    pub transform: GeoTransform,
    pub geo_keys: GeoKeys,
    pub nodata: Nodata,
}

impl GeoProfile {
    /// A profile with no georeferencing, for synthetic grids.
    pub fn bare(width: usize, height: usize, nodata: Nodata) -> Self {
        Self {
            width,
            height,
            band_count: 1,
            sample_format: SampleFormat::Float32,
            transform: GeoTransform::default(),
            geo_keys: GeoKeys::default(),
            nodata,
        }
    }

    /// Copy of this profile for a single-band output.
    pub fn single_band(&self) -> Self {
        Self {
            band_count: 1,
            ..self.clone()
        }
    }

    /// Copy of this profile with a different nodata sentinel.
    pub fn with_nodata(&self, nodata: Nodata) -> Self {
        Self {
            nodata,
            ..self.clone()
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}
