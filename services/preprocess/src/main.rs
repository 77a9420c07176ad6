//! Preprocessing tools for the coastal REI workflow.
//!
//! - `hrdps-table`: HRDPS NetCDF products to long and wide CSV tables
//! - `interpolate`: spline rasters for every wind statistic in a table
//! - `wave-means`: per-location mean across monthly wave files
//! - `bbox`, `convert`: coordinate helpers

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use interpolation::SplineConfig;
use rei_common::CrsCode;
use rei_grid::WritePolicy;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "preprocess")]
#[command(about = "Prepare wind, wave and coordinate inputs for REI modelling")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge HRDPS grand-mean and frequency NetCDF files into CSV tables
    HrdpsTable {
        /// Directory holding one subdirectory per region
        data_dir: PathBuf,
        /// Region subdirectory name
        region: String,
        /// Add BC Albers x, y columns to the wide table
        #[arg(long)]
        albers: bool,
    },

    /// Fit a regularized spline to every mx_spd / freq column of a table
    Interpolate {
        /// Output goes to <working_dir>/spline_hrdps
        working_dir: PathBuf,
        /// Point table (x, y or lon_dd, lat_dd columns)
        table: PathBuf,
        /// Output cell size in metres
        #[arg(long, default_value_t = SplineConfig::default().cell_size)]
        cell_size: f64,
        /// Regularization weight
        #[arg(long, default_value_t = SplineConfig::default().weight)]
        weight: f64,
        /// Largest point count fitted per field
        #[arg(long, default_value_t = SplineConfig::default().max_points)]
        max_points: usize,
        /// Overwrite existing rasters
        #[arg(long)]
        force: bool,
    },

    /// Average a variable across whitespace-delimited lon/lat/value files
    WaveMeans {
        directory: PathBuf,
        /// Variable name; also names the output <directory>/<variable>.csv
        variable: String,
        /// File extension to match
        extension: String,
        /// Substring file names must contain
        search: String,
        /// Subset bounds: "lat_min lat_max lon_min lon_max"
        #[arg(long)]
        coords: Option<String>,
    },

    /// Print a 0-360 longitude bounding box string: lon1,lon2,lat1,lat2
    #[command(allow_negative_numbers = true)]
    Bbox {
        sw_lon: f64,
        sw_lat: f64,
        ne_lon: f64,
        ne_lat: f64,
    },

    /// Convert a point between EPSG:4326 and EPSG:3005
    #[command(allow_negative_numbers = true)]
    Convert {
        x: f64,
        y: f64,
        #[arg(long)]
        from: CrsCode,
        #[arg(long)]
        to: CrsCode,
    },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Run one subcommand. `Ok(false)` means it completed with per-item failures.
fn run(command: Command) -> Result<bool> {
    match command {
        Command::HrdpsTable {
            data_dir,
            region,
            albers,
        } => {
            let tables = commands::hrdps_table(&data_dir, &region, albers)?;
            info!(
                long = %tables.long_table.display(),
                wide = %tables.wide_table.display(),
                locations = tables.locations,
                "HRDPS tables written"
            );
        }
        Command::Interpolate {
            working_dir,
            table,
            cell_size,
            weight,
            max_points,
            force,
        } => {
            let config = SplineConfig {
                cell_size,
                weight,
                max_points,
                ..Default::default()
            };
            let policy = WritePolicy::from_force(force);
            let report = commands::interpolate(&working_dir, &table, &config, policy)?;
            if !report.is_success() {
                warn!("{}", report);
                eprintln!("{}", report);
                return Ok(false);
            }
            info!(fields = report.total(), "All fields interpolated");
        }
        Command::WaveMeans {
            directory,
            variable,
            extension,
            search,
            coords,
        } => {
            let means = commands::wave_means(
                &directory,
                &variable,
                &extension,
                &search,
                coords.as_deref(),
            )?;
            info!(
                output = %means.output.display(),
                files = means.files,
                locations = means.locations,
                "Wave means written"
            );
        }
        Command::Bbox {
            sw_lon,
            sw_lat,
            ne_lon,
            ne_lat,
        } => {
            println!("{}", commands::bbox(sw_lon, sw_lat, ne_lon, ne_lat)?);
        }
        Command::Convert { x, y, from, to } => {
            let (cx, cy) = commands::convert(x, y, from, to)?;
            println!("{} {}", cx, cy);
        }
    }
    Ok(true)
}

fn main() -> ExitCode {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = init_tracing(&cli.log_level, cli.log_json) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Command failed");
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
