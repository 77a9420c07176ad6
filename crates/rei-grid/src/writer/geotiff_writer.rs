use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use tiff::encoder::{colortype, DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tracing::info;

use super::WritePolicy;
use crate::error::{GridError, Result};
use crate::types::{GeoProfile, Grid, SampleFormat};

/// Write `grid` as a single-band GeoTIFF using `profile`'s georeferencing.
///
/// The band count is always 1 on output. Samples are Float32 unless the
/// profile asks for Float64.
pub fn write_layer(
    path: impl AsRef<Path>,
    grid: &Grid,
    profile: &GeoProfile,
    policy: WritePolicy,
) -> Result<()> {
    let path = path.as_ref();
    let mut profile = profile.single_band();
    if profile.sample_format == SampleFormat::Float32 {
        // The tag must name the value the cells are cast to.
        profile.nodata = profile.nodata.to_f32_precision();
    }

    if grid.shape() != profile.shape() {
        return Err(GridError::DimensionMismatch {
            layer: path.display().to_string(),
            expected: profile.shape(),
            actual: grid.shape(),
        });
    }

    let (width, height) = (grid.width() as u32, grid.height() as u32);
    write_via_partial(path, policy, |writer| {
        let mut encoder = TiffEncoder::new(writer)?;
        match profile.sample_format {
            SampleFormat::Float32 => {
                let mut image = encoder.new_image::<colortype::Gray32Float>(width, height)?;
                write_geo_tags(image.encoder(), &profile)?;
                let data: Vec<f32> = grid.data().iter().map(|&v| v as f32).collect();
                image.write_data(&data)?;
            }
            SampleFormat::Float64 => {
                let mut image = encoder.new_image::<colortype::Gray64Float>(width, height)?;
                write_geo_tags(image.encoder(), &profile)?;
                image.write_data(grid.data())?;
            }
        }
        Ok(())
    })?;

    info!(
        path = %path.display(),
        width,
        height,
        format = ?profile.sample_format,
        "Wrote raster"
    );
    Ok(())
}

/// `<path>.partial`
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Run `encode` against `<path>.partial`, then rename it over `path`.
///
/// A failed encode removes the partial file and leaves `path` untouched.
fn write_via_partial<F>(path: &Path, policy: WritePolicy, encode: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if policy == WritePolicy::Reject && path.exists() {
        return Err(GridError::OutputExists(path.to_path_buf()));
    }

    let partial = partial_path(path);
    let written = File::create(&partial)
        .map_err(GridError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            encode(&mut writer)?;
            writer.flush()?;
            Ok(())
        });
    if let Err(e) = written {
        fs::remove_file(&partial).ok();
        return Err(e);
    }

    if policy == WritePolicy::Reject && path.exists() {
        fs::remove_file(&partial).ok();
        return Err(GridError::OutputExists(path.to_path_buf()));
    }
    fs::rename(&partial, path)?;
    Ok(())
}

fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    profile: &GeoProfile,
) -> Result<()> {
    let transform = &profile.transform;
    if let Some(scale) = &transform.pixel_scale {
        dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
    }
    if let Some(tiepoints) = &transform.tiepoints {
        dir.write_tag(Tag::ModelTiepointTag, &tiepoints[..])?;
    }
    if let Some(matrix) = &transform.transformation {
        dir.write_tag(Tag::ModelTransformationTag, &matrix[..])?;
    }

    let keys = &profile.geo_keys;
    if let Some(directory) = &keys.directory {
        dir.write_tag(Tag::GeoKeyDirectoryTag, &directory[..])?;
    }
    if let Some(params) = &keys.double_params {
        dir.write_tag(Tag::GeoDoubleParamsTag, &params[..])?;
    }
    if let Some(ascii) = &keys.ascii_params {
        dir.write_tag(Tag::GeoAsciiParamsTag, ascii.as_str())?;
    }

    if let Some(nodata) = profile.nodata.to_gdal_string() {
        dir.write_tag(Tag::GdalNodata, nodata.as_str())?;
    }
    Ok(())
}
