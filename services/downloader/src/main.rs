//! Reanalysis wind downloader.
//!
//! Requests hourly ERA5 data from the Copernicus Climate Data Store, one
//! year at a time, using a YAML request file:
//! - Credentials from the file or `CDSAPI_URL` / `CDSAPI_KEY`
//! - Existing yearly files are kept, not re-requested
//! - `--list` skips downloading and reports files already on disk

mod config;
mod download;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::CdsRequest;
use download::{list_existing, CdsClient, DownloadConfig};

#[derive(Parser, Debug)]
#[command(name = "downloader")]
#[command(about = "Download hourly reanalysis wind data from the Climate Data Store")]
struct Args {
    /// YAML request file
    #[arg(long, env = "CDS_CONFIG", default_value = "config/cds.yaml")]
    config: PathBuf,

    /// Use already-downloaded .nc files instead of downloading
    #[arg(long)]
    list: bool,

    /// Override the output directory from the request file
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Seconds between job status checks
    #[arg(long, default_value = "30")]
    poll_secs: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
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

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let mut request = CdsRequest::load(&args.config)?;
    request.apply_env();
    if let Some(dir) = args.output_dir {
        request.output_dir = dir;
    }
    request.validate()?;

    tokio::fs::create_dir_all(&request.output_dir).await?;

    if args.list {
        let files = list_existing(&request.output_dir)?;
        for file in &files {
            info!(path = %file.display(), "Found NetCDF file");
        }
        return Ok(());
    }

    info!(
        dataset = %request.dataset,
        years = ?request.years(),
        output_dir = %request.output_dir.display(),
        "Starting reanalysis download"
    );

    let client = CdsClient::new(
        &request,
        DownloadConfig {
            poll_interval: Duration::from_secs(args.poll_secs),
            ..Default::default()
        },
    )?;
    let report = client.download_all(&request).await;

    info!(
        downloaded = report.downloaded().len(),
        failed = report.failed_years().len(),
        elapsed_secs = ?report.elapsed_secs(),
        "Download session complete"
    );

    if !report.is_success() {
        warn!(years = ?report.failed_years(), "Some years failed to download");
        bail!("{} of {} years failed", report.failed_years().len(), report.outcomes.len());
    }
    Ok(())
}
