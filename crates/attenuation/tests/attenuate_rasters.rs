//! End-to-end attenuation over GeoTIFF layers on disk.

use std::path::Path;

use attenuation::{
    decay_constant, process, AttenuationConfig, AttenuationError, AttenuationInputs, DecayModel,
};
use rei_grid::{
    load_layer, write_layer, GeoKeys, GeoProfile, GeoTransform, Grid, GridError, Nodata,
    SampleFormat, WritePolicy,
};
use test_utils::{
    assert_approx_eq, create_constant_grid, create_depth_grid, create_exposure_grid, geo, nodata,
    temp_test_dir, with_nodata_cells,
};

const WIDTH: usize = 6;
const HEIGHT: usize = 4;

fn profile(nodata: Nodata) -> GeoProfile {
    GeoProfile {
        width: WIDTH,
        height: HEIGHT,
        band_count: 1,
        sample_format: SampleFormat::Float32,
        transform: GeoTransform {
            pixel_scale: Some(geo::PIXEL_SCALE.to_vec()),
            tiepoints: Some(geo::TIEPOINT.to_vec()),
            transformation: None,
        },
        geo_keys: GeoKeys {
            directory: Some(geo::GEO_KEYS_3005.to_vec()),
            ..Default::default()
        },
        nodata,
    }
}

fn write(path: &Path, data: Vec<f64>, nodata: Nodata) {
    let grid = Grid::new(data, WIDTH, HEIGHT).unwrap();
    write_layer(path, &grid, &profile(nodata), WritePolicy::Overwrite).unwrap();
}

/// Exposure with a nodata cell at (0, 0), depth with a land column, slope.
fn write_inputs(dir: &Path) -> std::path::PathBuf {
    let exposure = with_nodata_cells(
        &create_exposure_grid(WIDTH, HEIGHT, 4.0),
        WIDTH,
        &[(0, 0)],
        nodata::DEFAULT,
    );
    let exposure_path = dir.join("rei_exposure.tif");
    write(&exposure_path, exposure, Nodata::Value(nodata::DEFAULT));
    write(
        &dir.join("bathymetry.tif"),
        create_depth_grid(WIDTH, HEIGHT, 0.5),
        Nodata::Value(-32767.0),
    );
    let mut slope = create_constant_grid(WIDTH, HEIGHT, 2.0);
    slope[WIDTH + 1] = 0.0;
    write(&dir.join("slope.tif"), slope, Nodata::Value(-1.0));
    exposure_path
}

#[test]
fn test_nodata_cell_survives_as_sentinel() {
    let dir = temp_test_dir();
    let exposure = write_inputs(dir.path());
    let output = dir.path().join("rei_sog_1.tif");

    let (path, report) = process(dir.path(), &exposure, &output, &AttenuationConfig::default())
        .unwrap();
    assert_eq!(path, output);

    let layer = load_layer(&output).unwrap();
    assert_eq!(layer.grid.get(0, 0), Some(nodata::DEFAULT));
    assert_eq!(layer.nodata, Nodata::Value(nodata::DEFAULT));
    assert_eq!(layer.profile.band_count, 1);
    assert_eq!(report.total, WIDTH * HEIGHT);
    assert_eq!(report.masked, 1);
    // Columns at -2.0, 0.5 and 1.0 m are at or below the 1 m floor;
    // (0, 0) is masked.
    assert_eq!(report.depth_floored, 3 * HEIGHT - 1);
}

#[test]
fn test_output_values_follow_formula() {
    let dir = temp_test_dir();
    let exposure = write_inputs(dir.path());
    let output = dir.path().join("rei_sog_2.tif");

    let config = AttenuationConfig {
        decay: DecayModel::Constant(0.05),
        ..Default::default()
    };
    process(dir.path(), &exposure, &output, &config).unwrap();

    let input = load_layer(&exposure).unwrap();
    let result = load_layer(&output).unwrap();
    for (col, depth) in [(1usize, 1.0f64), (3, 1.5), (5, 2.5)] {
        let rei = input.grid.get(col, 2).unwrap();
        let expected = rei * (-0.05 * depth).exp();
        assert_approx_eq!(result.grid.get(col, 2).unwrap(), expected, 1e-5);
    }
}

#[test]
fn test_slope_term_applied_when_enabled() {
    let dir = temp_test_dir();
    let exposure = write_inputs(dir.path());
    let output = dir.path().join("rei_wcvi_3.tif");

    let config = AttenuationConfig {
        decay: DecayModel::Constant(0.05),
        use_slope: true,
        ..Default::default()
    };
    let (_, report) = process(dir.path(), &exposure, &output, &config).unwrap();
    assert_eq!(report.slope_corrected, 1);

    let input = load_layer(&exposure).unwrap();
    let result = load_layer(&output).unwrap();
    let base = (-0.05f64 * 1.0).exp();
    assert_approx_eq!(
        result.grid.get(1, 1).unwrap(),
        input.grid.get(1, 1).unwrap() * base * 0.1,
        1e-5
    );
    assert_approx_eq!(
        result.grid.get(2, 1).unwrap(),
        input.grid.get(2, 1).unwrap() * base * 2.0,
        1e-5
    );
}

#[test]
fn test_runs_are_bit_identical() {
    let dir = temp_test_dir();
    let exposure = write_inputs(dir.path());
    let inputs = AttenuationInputs::load(dir.path(), &exposure, true).unwrap();
    let config = AttenuationConfig {
        use_slope: true,
        ..Default::default()
    };

    let (a, _, _) = inputs.run(&config).unwrap();
    let (b, _, _) = inputs.run(&config).unwrap();
    let bits = |g: &Grid| g.data().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a), bits(&b));
}

#[test]
fn test_exposure_derived_scenario_on_disk() {
    let dir = temp_test_dir();
    write(
        &dir.path().join("bathymetry.tif"),
        create_constant_grid(WIDTH, HEIGHT, 0.2),
        Nodata::None,
    );
    let exposure = dir.path().join("rei.tif");
    write(&exposure, create_constant_grid(WIDTH, HEIGHT, 5.0), Nodata::None);

    let inputs = AttenuationInputs::load(dir.path(), &exposure, false).unwrap();
    let (grid, profile, report) = inputs.run(&AttenuationConfig::default()).unwrap();

    let expected = 5.0 * (-decay_constant(5.0)).exp();
    assert_approx_eq!(grid.get(3, 2).unwrap(), expected, 1e-300);
    assert_eq!(report.depth_floored, WIDTH * HEIGHT);
    // No sentinel on the exposure layer: output falls back to -9999.
    assert_eq!(profile.nodata, Nodata::Value(-9999.0));
}

#[test]
fn test_existing_output_rejected_without_force() {
    let dir = temp_test_dir();
    let exposure = write_inputs(dir.path());
    let output = dir.path().join("rei_hg_5.tif");
    std::fs::write(&output, b"previous run").unwrap();

    let err = process(dir.path(), &exposure, &output, &AttenuationConfig::default())
        .unwrap_err();
    assert!(matches!(err, AttenuationError::Grid(GridError::OutputExists(_))));
    assert_eq!(std::fs::read(&output).unwrap(), b"previous run");

    let config = AttenuationConfig {
        write_policy: WritePolicy::Overwrite,
        ..Default::default()
    };
    process(dir.path(), &exposure, &output, &config).unwrap();
    assert!(load_layer(&output).is_ok());
}

#[test]
fn test_missing_slope_is_reported() {
    let dir = temp_test_dir();
    let exposure = write_inputs(dir.path());
    std::fs::remove_file(dir.path().join("slope.tif")).unwrap();

    let err = AttenuationInputs::load(dir.path(), &exposure, true).unwrap_err();
    assert!(matches!(err, AttenuationError::MissingSlope(_)));
}

#[test]
fn test_misaligned_bathymetry_fails_fast() {
    let dir = temp_test_dir();
    let exposure = write_inputs(dir.path());

    let mut shifted = profile(Nodata::None);
    shifted.transform.tiepoints = Some(vec![0.0, 0.0, 0.0, 1_022_000.0, 398_100.0, 0.0]);
    let grid = Grid::new(create_depth_grid(WIDTH, HEIGHT, 1.0), WIDTH, HEIGHT).unwrap();
    write_layer(
        dir.path().join("bathymetry.tif"),
        &grid,
        &shifted,
        WritePolicy::Overwrite,
    )
    .unwrap();

    let err = AttenuationInputs::load(dir.path(), &exposure, false).unwrap_err();
    assert!(matches!(
        err,
        AttenuationError::Grid(GridError::Misaligned { .. })
    ));
}

#[test]
fn test_missing_bathymetry_is_io_error() {
    let dir = temp_test_dir();
    let exposure = dir.path().join("rei.tif");
    write(&exposure, create_constant_grid(WIDTH, HEIGHT, 1.0), Nodata::None);

    let err = AttenuationInputs::load(dir.path(), &exposure, false).unwrap_err();
    assert!(matches!(err, AttenuationError::Grid(GridError::Io(_))));
}
