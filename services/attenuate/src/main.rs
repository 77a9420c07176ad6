//! Depth-attenuated REI.
//!
//! Reads `bathymetry.tif` (and `slope.tif` with `--slope`) from a raster
//! directory, attenuates the exposure raster and writes
//! `<outdir>/rei_{region}_{version}.tif`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use attenuation::{AttenuationConfig, DecayModel, InvalidExposurePolicy};
use clap::builder::FalseyValueParser;
use clap::Parser;
use rei_common::{output_file_name, ModelVersion, Region};
use rei_grid::WritePolicy;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "attenuate")]
#[command(about = "Attenuate relative exposure index by depth")]
struct Args {
    /// Directory containing bathymetry.tif (and slope.tif)
    raster_dir: PathBuf,

    /// Region: sog, qcs, ncc, wcvi or hg
    region: Region,

    /// Model version, 1 to 5
    version: ModelVersion,

    /// Exposure (REI) raster
    exposure: PathBuf,

    /// Output directory
    outdir: PathBuf,

    /// Minimum depth in metres; shallower cells and land use this depth
    #[arg(long, env = "REI_DEPTH_FLOOR")]
    floor: Option<f64>,

    /// Multiply in the slope term from slope.tif
    #[arg(long)]
    slope: bool,

    /// Use a fixed decay constant instead of deriving it from REI
    #[arg(long)]
    constant: Option<f64>,

    /// Handling of exposure values <= 0 or not finite: mask or fail
    #[arg(long)]
    invalid_exposure: Option<InvalidExposurePolicy>,

    /// Overwrite an existing output
    #[arg(long, env = "REI_OVERWRITE", value_parser = FalseyValueParser::new())]
    force: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Environment defaults overridden by whatever was given on the command line.
    fn config(&self) -> AttenuationConfig {
        let mut config = AttenuationConfig::from_env();
        if let Some(floor) = self.floor {
            config.depth_floor = floor;
        }
        if self.slope {
            config.use_slope = true;
        }
        if let Some(k) = self.constant {
            config.decay = DecayModel::Constant(k);
        }
        if let Some(policy) = self.invalid_exposure {
            config.invalid_exposure = policy;
        }
        if self.force {
            config.write_policy = WritePolicy::Overwrite;
        }
        config
    }

    fn output(&self) -> PathBuf {
        self.outdir.join(output_file_name(self.region, self.version))
    }
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
        .with_target(true);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = args.config();
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid attenuation settings")?;

    std::fs::create_dir_all(&args.outdir)
        .with_context(|| format!("Failed to create {}", args.outdir.display()))?;

    info!(
        region = %args.region,
        version = %args.version,
        exposure = %args.exposure.display(),
        floor = config.depth_floor,
        slope = config.use_slope,
        decay = ?config.decay,
        "Starting attenuation"
    );

    let (output, report) =
        attenuation::process(&args.raster_dir, &args.exposure, args.output(), &config)
            .with_context(|| format!("Failed to attenuate {}", args.exposure.display()))?;

    info!(
        output = %output.display(),
        total = report.total,
        attenuated = report.attenuated(),
        masked = report.masked,
        invalid_exposure = report.invalid_exposure,
        invalid_terrain = report.invalid_terrain,
        depth_floored = report.depth_floored,
        slope_corrected = report.slope_corrected,
        "Wrote attenuated REI"
    );
    Ok(())
}

fn main() -> ExitCode {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    if let Err(e) = init_tracing(&args.log_level, args.log_json) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Attenuation failed");
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["attenuate", "rasters", "wcvi", "3", "rei.tif", "out"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_positional_arguments() {
        let args = parse(&[]);
        assert_eq!(args.region, Region::Wcvi);
        assert_eq!(args.version.get(), 3);
        assert_eq!(args.output(), PathBuf::from("out/rei_wcvi_3.tif"));
    }

    #[test]
    fn test_rejects_unknown_region_and_version() {
        assert!(Args::try_parse_from(["attenuate", "r", "xyz", "1", "e.tif", "o"]).is_err());
        assert!(Args::try_parse_from(["attenuate", "r", "sog", "6", "e.tif", "o"]).is_err());
    }

    #[test]
    fn test_options_override_config() {
        let args = parse(&[
            "--floor",
            "2.5",
            "--slope",
            "--constant",
            "0.8",
            "--invalid-exposure",
            "fail",
            "--force",
        ]);
        let config = args.config();
        assert_eq!(config.depth_floor, 2.5);
        assert!(config.use_slope);
        assert_eq!(config.decay, DecayModel::Constant(0.8));
        assert_eq!(config.invalid_exposure, InvalidExposurePolicy::Fail);
        assert_eq!(config.write_policy, WritePolicy::Overwrite);
    }

    #[test]
    fn test_invalid_floor_fails_run() {
        let dir = test_utils::temp_test_dir();
        let out = dir.path().join("out");
        let mut args = parse(&["--floor", "0"]);
        args.outdir = out.clone();
        assert!(run(&args).is_err());
        assert!(!out.exists());
    }
}
