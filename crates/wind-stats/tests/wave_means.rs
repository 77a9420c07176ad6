//! End-to-end wave-means runs over a directory of monthly files.

use std::fs;

use rei_common::BoundingBox;
use test_utils::{assert_approx_eq, temp_test_dir};
use wind_stats::{process_wave_means, WindStatsError};

const ROWS: [(f64, f64); 3] = [(-125.70, 48.60), (-125.10, 49.00), (-126.50, 49.20)];

fn write_month(dir: &std::path::Path, name: &str, values: [f64; 3]) {
    let text: String = ROWS
        .iter()
        .zip(values)
        .map(|((lon, lat), v)| format!("{} {} {}\n", lon, lat, v))
        .collect();
    fs::write(dir.join(name), text).unwrap();
}

#[test]
fn test_mean_of_monthly_files() {
    let dir = temp_test_dir();
    write_month(dir.path(), "hsig_01_mean.txt", [1.0, 2.0, 3.0]);
    write_month(dir.path(), "hsig_02_mean.txt", [3.0, f64::NAN, 5.0]);
    write_month(dir.path(), "tp_01_mean.txt", [9.0, 9.0, 9.0]);

    let result = process_wave_means(dir.path(), "hsig", "txt", "hsig", None).unwrap();
    assert_eq!(result.files, 2);
    assert_eq!(result.locations, 3);
    assert_eq!(result.output, dir.path().join("hsig.csv"));

    let mut reader = csv::Reader::from_path(&result.output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["longitude", "latitude", "mean_hsig", "x", "y"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    let mean = |i: usize| rows[i][2].parse::<f64>().unwrap();
    assert_approx_eq!(mean(0), 2.0, 1e-12);
    assert_approx_eq!(mean(1), 2.0, 1e-12);
    assert_approx_eq!(mean(2), 4.0, 1e-12);
}

#[test]
fn test_subset_by_coordinates() {
    let dir = temp_test_dir();
    write_month(dir.path(), "hsig_01_mean.txt", [1.0, 2.0, 3.0]);
    write_month(dir.path(), "hsig_02_mean.txt", [3.0, 4.0, 5.0]);

    let bbox = BoundingBox::from_lat_lon_string("48.5 49.1 -125.8 -124.5").unwrap();
    let result = process_wave_means(dir.path(), "hsig", "txt", "hsig", Some(&bbox)).unwrap();
    assert_eq!(result.locations, 2);
}

#[test]
fn test_refuses_existing_output() {
    let dir = temp_test_dir();
    write_month(dir.path(), "hsig_01_mean.txt", [1.0, 2.0, 3.0]);
    fs::write(dir.path().join("hsig.csv"), "keep me").unwrap();

    let err = process_wave_means(dir.path(), "hsig", "txt", "hsig", None).unwrap_err();
    assert!(matches!(err, WindStatsError::OutputExists(_)));
    assert_eq!(fs::read_to_string(dir.path().join("hsig.csv")).unwrap(), "keep me");
}

#[test]
fn test_no_matching_files() {
    let dir = temp_test_dir();
    write_month(dir.path(), "tp_01_mean.txt", [1.0, 2.0, 3.0]);
    let err = process_wave_means(dir.path(), "hsig", "txt", "hsig", None).unwrap_err();
    assert!(matches!(err, WindStatsError::NoFiles { .. }));
}

#[test]
fn test_shape_mismatch_is_an_error() {
    let dir = temp_test_dir();
    write_month(dir.path(), "hsig_01_mean.txt", [1.0, 2.0, 3.0]);
    fs::write(dir.path().join("hsig_02_mean.txt"), "-125.7 48.6 1.0\n").unwrap();
    let err = process_wave_means(dir.path(), "hsig", "txt", "hsig", None).unwrap_err();
    assert!(matches!(err, WindStatsError::ShapeMismatch { .. }));
    assert!(!dir.path().join("hsig.csv").exists());
}

#[cfg(not(feature = "netcdf"))]
#[test]
fn test_netcdf_disabled() {
    let err = wind_stats::read_region("/tmp").unwrap_err();
    assert!(matches!(err, WindStatsError::NetCdfUnavailable));
}
