//! GeoTIFF layer loading.
//!
//! Uses the pure Rust `tiff` crate; no GDAL installation is needed. Only
//! band 1 is read. Georeferencing tags are kept verbatim in a
//! [`GeoProfile`] so the writer can reproduce them on output.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{GridError, Result};
use crate::mask::MaskedGrid;
use crate::types::{GeoKeys, GeoProfile, GeoTransform, Grid, Nodata, SampleFormat};

/// A single raster band loaded from disk.
#[derive(Debug, Clone)]
pub struct Layer {
    pub path: PathBuf,
    pub grid: Grid,
    pub nodata: Nodata,
    pub profile: GeoProfile,
}

impl Layer {
    /// Short name for diagnostics: the file stem, or the full path.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Mask this layer's grid with its own nodata sentinel.
    pub fn masked(&self) -> MaskedGrid {
        MaskedGrid::from_grid(self.grid.clone(), self.nodata)
    }

    pub fn into_masked(self) -> MaskedGrid {
        MaskedGrid::from_grid(self.grid, self.nodata)
    }
}

/// Load band 1 of a GeoTIFF together with its nodata sentinel and profile.
pub fn load_layer(path: impl AsRef<Path>) -> Result<Layer> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let transform = GeoTransform {
        pixel_scale: decoder
            .find_tag(Tag::ModelPixelScaleTag)?
            .map(|v| v.into_f64_vec())
            .transpose()?,
        tiepoints: decoder
            .find_tag(Tag::ModelTiepointTag)?
            .map(|v| v.into_f64_vec())
            .transpose()?,
        transformation: decoder
            .find_tag(Tag::ModelTransformationTag)?
            .map(|v| v.into_f64_vec())
            .transpose()?,
    };

    let geo_keys = GeoKeys {
        directory: decoder
            .find_tag(Tag::GeoKeyDirectoryTag)?
            .map(|v| v.into_u16_vec())
            .transpose()?,
        double_params: decoder
            .find_tag(Tag::GeoDoubleParamsTag)?
            .map(|v| v.into_f64_vec())
            .transpose()?,
        ascii_params: decoder
            .find_tag(Tag::GeoAsciiParamsTag)?
            .map(|v| v.into_string())
            .transpose()?,
    };

    let mut nodata = match decoder
        .find_tag(Tag::GdalNodata)?
        .map(|v| v.into_string())
        .transpose()?
    {
        Some(text) => Nodata::from_gdal_str(&text)?,
        None => Nodata::None,
    };

    let image = decoder.read_image()?;
    if matches!(image, DecodingResult::F32(_)) {
        nodata = nodata.to_f32_precision();
    }
    let (samples, sample_format) = decode_samples(image, path)?;

    let pixels = width * height;
    if pixels == 0 || samples.len() < pixels {
        return Err(GridError::NoBands(path.display().to_string()));
    }
    let band_count = samples.len() / pixels;
    let band1 = extract_band(&samples, band_count);
    let grid = Grid::new(band1, width, height)?;

    debug!(
        path = %path.display(),
        width,
        height,
        band_count,
        nodata = ?nodata,
        georeferenced = !transform.is_empty(),
        "Loaded raster layer"
    );

    let profile = GeoProfile {
        width,
        height,
        band_count: u16::try_from(band_count).unwrap_or(u16::MAX),
        sample_format,
        transform,
        geo_keys,
        nodata,
    };

    Ok(Layer {
        path: path.to_path_buf(),
        grid,
        nodata,
        profile,
    })
}

/// Flatten any decoded sample type to `f64`.
fn decode_samples(result: DecodingResult, path: &Path) -> Result<(Vec<f64>, SampleFormat)> {
    let converted = match result {
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => return Ok((data, SampleFormat::Float64)),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(GridError::UnsupportedDataType(format!(
                "{}: unsupported sample type",
                path.display()
            )))
        }
    };
    Ok((converted, SampleFormat::Float32))
}

/// Take every `band_count`-th sample starting at 0 (chunky layout).
fn extract_band(samples: &[f64], band_count: usize) -> Vec<f64> {
    if band_count <= 1 {
        return samples.to_vec();
    }
    samples.iter().step_by(band_count).copied().collect()
}
