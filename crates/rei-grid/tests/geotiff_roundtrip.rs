//! Integration test: write GeoTIFF layers to disk and read them back.
//!
//! Verifies that cell values, nodata sentinels and georeferencing tags all
//! survive the writer and the loader unchanged.

use std::fs::File;
use std::io::BufWriter;

use rei_grid::{
    check_coregistered, load_layer, write_layer, GeoKeys, GeoProfile, GeoTransform, Grid,
    GridError, Nodata, SampleFormat, WritePolicy,
};
use test_utils::{create_test_grid, geo, nodata, temp_test_dir, with_nodata_cells};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

fn albers_profile(width: usize, height: usize, nodata: Nodata) -> GeoProfile {
    GeoProfile {
        width,
        height,
        band_count: 1,
        sample_format: SampleFormat::Float32,
        transform: GeoTransform {
            pixel_scale: Some(geo::PIXEL_SCALE.to_vec()),
            tiepoints: Some(geo::TIEPOINT.to_vec()),
            transformation: None,
        },
        geo_keys: GeoKeys {
            directory: Some(geo::GEO_KEYS_3005.to_vec()),
            double_params: None,
            ascii_params: Some("NAD83 / BC Albers|".to_string()),
        },
        nodata,
    }
}

#[test]
fn test_float32_roundtrip_preserves_values_and_tags() {
    let dir = temp_test_dir();
    let path = dir.path().join("exposure.tif");

    let (width, height) = (12, 7);
    let data = with_nodata_cells(
        &create_test_grid(width, height),
        width,
        &[(0, 0), (11, 6)],
        nodata::DEFAULT,
    );
    let grid = Grid::new(data.clone(), width, height).unwrap();
    let profile = albers_profile(width, height, Nodata::Value(nodata::DEFAULT));

    write_layer(&path, &grid, &profile, WritePolicy::Reject).unwrap();
    let layer = load_layer(&path).unwrap();

    assert_eq!(layer.grid.shape(), (width, height));
    // Test values are small integers, exact in f32.
    assert_eq!(layer.grid.data(), &data[..]);
    assert_eq!(layer.nodata, Nodata::Value(nodata::DEFAULT));
    assert_eq!(layer.profile.transform, profile.transform);
    assert_eq!(layer.profile.geo_keys.directory, profile.geo_keys.directory);
    assert_eq!(layer.profile.band_count, 1);
    assert_eq!(layer.profile.sample_format, SampleFormat::Float32);

    let masked = layer.masked();
    assert_eq!(masked.masked_count(), 2);
    assert_eq!(masked.get(0, 0), None);
    assert!(check_coregistered(&profile, &layer.profile, "exposure").is_ok());
}

#[test]
fn test_float64_roundtrip_is_exact() {
    let dir = temp_test_dir();
    let path = dir.path().join("precise.tif");

    let grid = Grid::from_fn(5, 4, |col, row| 0.1 * col as f64 + 1e-12 * row as f64);
    let mut profile = albers_profile(5, 4, Nodata::None);
    profile.sample_format = SampleFormat::Float64;

    write_layer(&path, &grid, &profile, WritePolicy::Reject).unwrap();
    let layer = load_layer(&path).unwrap();

    assert_eq!(layer.grid, grid);
    assert_eq!(layer.nodata, Nodata::None);
    assert_eq!(layer.profile.sample_format, SampleFormat::Float64);
}

#[test]
fn test_nan_sentinel_roundtrip() {
    let dir = temp_test_dir();
    let path = dir.path().join("nan.tif");

    let grid = Grid::new(vec![f64::NAN, 1.0, 2.0, f64::NAN], 2, 2).unwrap();
    let profile = albers_profile(2, 2, Nodata::Value(f64::NAN));
    write_layer(&path, &grid, &profile, WritePolicy::Reject).unwrap();

    let layer = load_layer(&path).unwrap();
    assert_eq!(layer.nodata, Nodata::Value(f64::NAN));
    assert_eq!(layer.masked().masked_count(), 2);
}

#[test]
fn test_f32_lowest_sentinel_roundtrip() {
    let dir = temp_test_dir();
    let path = dir.path().join("bathymetry.tif");

    let data = vec![nodata::F32_LOWEST, -3.5, 12.25, nodata::F32_LOWEST];
    let grid = Grid::new(data, 2, 2).unwrap();
    let profile = albers_profile(2, 2, Nodata::Value(nodata::F32_LOWEST));
    write_layer(&path, &grid, &profile, WritePolicy::Reject).unwrap();

    let layer = load_layer(&path).unwrap();
    assert_eq!(layer.nodata, Nodata::Value(nodata::F32_LOWEST));
    let masked = layer.masked();
    assert_eq!(masked.masked_count(), 2);
    assert_eq!(masked.get(1, 0), Some(12.25));
}

#[test]
fn test_arcgis_sentinel_text_masks_f32_cells() {
    let dir = temp_test_dir();
    let path = dir.path().join("arcgis_depth.tif");

    // ArcGIS writes the float lowest with fewer digits than f64 needs.
    {
        let file = File::create(&path).unwrap();
        let mut writer = BufWriter::new(file);
        let mut encoder = TiffEncoder::new(&mut writer).unwrap();
        let mut image = encoder.new_image::<colortype::Gray32Float>(2, 1).unwrap();
        image
            .encoder()
            .write_tag(Tag::GdalNodata, "-3.40282346639e+038")
            .unwrap();
        image.write_data(&[-3.40282346639e38f32, 5.0]).unwrap();
    }

    let layer = load_layer(&path).unwrap();
    let masked = layer.masked();
    assert_eq!(masked.masked_count(), 1);
    assert_eq!(masked.get(1, 0), Some(5.0));
}

#[test]
fn test_f32_output_writes_rounded_sentinel() {
    let dir = temp_test_dir();
    let path = dir.path().join("rei_int_max.tif");

    // i32::MAX has no exact f32; the cells and the tag must round together.
    let sentinel = i32::MAX as f64;
    let grid = Grid::new(vec![sentinel, 0.75], 2, 1).unwrap();
    let profile = albers_profile(2, 1, Nodata::Value(sentinel));
    write_layer(&path, &grid, &profile, WritePolicy::Reject).unwrap();

    let layer = load_layer(&path).unwrap();
    assert_eq!(layer.nodata, Nodata::Value(sentinel as f32 as f64));
    let masked = layer.masked();
    assert_eq!(masked.masked_count(), 1);
    assert_eq!(masked.get(1, 0), Some(0.75));
}

#[test]
fn test_reject_policy_refuses_existing_output() {
    let dir = temp_test_dir();
    let path = dir.path().join("rei_sog_1.tif");

    let grid = Grid::filled(3, 3, 1.0);
    let profile = albers_profile(3, 3, Nodata::Value(nodata::DEFAULT));
    write_layer(&path, &grid, &profile, WritePolicy::Reject).unwrap();

    let err = write_layer(&path, &Grid::filled(3, 3, 2.0), &profile, WritePolicy::Reject)
        .unwrap_err();
    assert!(matches!(err, GridError::OutputExists(ref p) if p == &path));

    // First write is untouched.
    assert_eq!(load_layer(&path).unwrap().grid.data(), &[1.0; 9]);
}

#[test]
fn test_overwrite_policy_replaces_output() {
    let dir = temp_test_dir();
    let path = dir.path().join("rei_sog_1.tif");
    let profile = albers_profile(3, 3, Nodata::None);

    write_layer(&path, &Grid::filled(3, 3, 1.0), &profile, WritePolicy::Reject).unwrap();
    write_layer(&path, &Grid::filled(3, 3, 2.0), &profile, WritePolicy::Overwrite).unwrap();

    assert_eq!(load_layer(&path).unwrap().grid.data(), &[2.0; 9]);
}

#[test]
fn test_write_rejects_shape_mismatch() {
    let dir = temp_test_dir();
    let path = dir.path().join("bad.tif");
    let err = write_layer(
        &path,
        &Grid::filled(3, 3, 1.0),
        &albers_profile(4, 3, Nodata::None),
        WritePolicy::Reject,
    )
    .unwrap_err();
    assert!(matches!(err, GridError::DimensionMismatch { .. }));
    assert!(!path.exists());
}

#[test]
fn test_multiband_input_reads_band_one() {
    let dir = temp_test_dir();
    let path = dir.path().join("rgb.tif");

    {
        let file = File::create(&path).unwrap();
        let mut writer = BufWriter::new(file);
        let mut encoder = TiffEncoder::new(&mut writer).unwrap();
        // 2x1 pixels, three samples each.
        encoder
            .write_image::<colortype::RGB8>(2, 1, &[10, 20, 30, 40, 50, 60])
            .unwrap();
    }

    let layer = load_layer(&path).unwrap();
    assert_eq!(layer.grid.data(), &[10.0, 40.0]);
    assert_eq!(layer.profile.band_count, 3);
    assert_eq!(layer.profile.single_band().band_count, 1);
}

#[test]
fn test_integer_input_is_promoted() {
    let dir = temp_test_dir();
    let path = dir.path().join("slope.tif");

    {
        let file = File::create(&path).unwrap();
        let mut writer = BufWriter::new(file);
        let mut encoder = TiffEncoder::new(&mut writer).unwrap();
        encoder
            .write_image::<colortype::Gray16>(2, 2, &[0, 1, 2, 65535])
            .unwrap();
    }

    let layer = load_layer(&path).unwrap();
    assert_eq!(layer.grid.data(), &[0.0, 1.0, 2.0, 65535.0]);
    assert_eq!(layer.nodata, Nodata::None);
    assert!(layer.profile.transform.is_empty());
}
