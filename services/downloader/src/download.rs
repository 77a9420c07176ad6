//! Client for the CDS retrieve API (v1).
//!
//! One job per year: submit, poll until it finishes, then stream the result
//! asset to disk. Years are processed strictly one after another.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::config::CdsRequest;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// HTTP and polling settings.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Delay between job status requests
    pub poll_interval: Duration,
    /// Give up on a job after this many status requests
    pub max_polls: u32,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_polls: 2880, // 24 hours at 30 s
            request_timeout: Duration::from_secs(3600),
        }
    }
}

/// Job states reported by the retrieve API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Accepted,
    Running,
    Successful,
    Failed,
    Dismissed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Accepted | JobStatus::Running)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobInfo {
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobResults {
    pub asset: Asset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub value: AssetValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetValue {
    pub href: String,
    #[serde(rename = "file:size", default)]
    pub size: Option<u64>,
}

/// Outcome of one year's request.
#[derive(Debug)]
pub struct YearOutcome {
    pub year: u16,
    pub result: Result<PathBuf>,
}

/// Per-year results of a download session.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<YearOutcome>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DownloadReport {
    pub fn downloaded(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(PathBuf::as_path))
            .collect()
    }

    pub fn failed_years(&self) -> Vec<u16> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.year)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn elapsed_secs(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_seconds()),
            _ => None,
        }
    }
}

/// Retrieve API client bound to one request file.
pub struct CdsClient {
    client: Client,
    config: DownloadConfig,
    base_url: String,
    key: String,
}

impl CdsClient {
    pub fn new(request: &CdsRequest, config: DownloadConfig) -> Result<Self> {
        let key = request.api_key()?.to_string();
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            base_url: request.url.trim_end_matches('/').to_string(),
            key,
        })
    }

    pub fn execution_url(&self, dataset: &str) -> String {
        format!("{}/retrieve/v1/processes/{}/execution", self.base_url, dataset)
    }

    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}/retrieve/v1/jobs/{}", self.base_url, job_id)
    }

    pub fn results_url(&self, job_id: &str) -> String {
        format!("{}/results", self.job_url(job_id))
    }

    /// Request every year in turn. A failed year is logged and recorded;
    /// later years are still attempted.
    pub async fn download_all(&self, request: &CdsRequest) -> DownloadReport {
        let mut report = DownloadReport {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        for year in request.years() {
            let result = self.download_year(request, year).await;
            match &result {
                Ok(path) => info!(year, path = %path.display(), "Download complete"),
                Err(e) => warn!(year, error = %format!("{:#}", e), "Download failed"),
            }
            report.outcomes.push(YearOutcome { year, result });
        }

        report.finished_at = Some(Utc::now());
        report
    }

    /// Submit, wait for and fetch one year.
    #[instrument(skip(self, request), fields(dataset = %request.dataset))]
    pub async fn download_year(&self, request: &CdsRequest, year: u16) -> Result<PathBuf> {
        let output = request.output_path(year);
        if output.exists() {
            info!(path = %output.display(), "File already exists, skipping download");
            return Ok(output);
        }

        info!(year, "Requesting data from the Climate Data Store");
        let job = self.submit(request, year).await?;
        let status = self.wait(&job.job_id, job.status).await?;
        if status != JobStatus::Successful {
            bail!("job {} ended with status {:?}", job.job_id, status);
        }

        let results: JobResults = self
            .get(&self.results_url(&job.job_id))
            .await?
            .json()
            .await
            .context("Failed to decode job results")?;

        self.fetch(&results.asset.value, &output).await?;
        Ok(output)
    }

    async fn submit(&self, request: &CdsRequest, year: u16) -> Result<JobInfo> {
        let body = serde_json::json!({ "inputs": request.inputs(year) });
        let response = self
            .client
            .post(self.execution_url(&request.dataset))
            .header(TOKEN_HEADER, &self.key)
            .json(&body)
            .send()
            .await
            .context("HTTP request failed")?;
        let job: JobInfo = check_status(response)
            .await?
            .json()
            .await
            .context("Failed to decode job submission")?;

        debug!(job_id = %job.job_id, status = ?job.status, "Submitted job");
        Ok(job)
    }

    async fn wait(&self, job_id: &str, mut status: JobStatus) -> Result<JobStatus> {
        let mut polls = 0;
        while !status.is_finished() {
            if polls >= self.config.max_polls {
                bail!("job {} still {:?} after {} polls", job_id, status, polls);
            }
            tokio::time::sleep(self.config.poll_interval).await;
            polls += 1;

            let job: JobInfo = self
                .get(&self.job_url(job_id))
                .await?
                .json()
                .await
                .context("Failed to decode job status")?;
            if job.status != status {
                info!(job_id, status = ?job.status, "Job status changed");
            }
            status = job.status;
        }
        Ok(status)
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.key)
            .send()
            .await
            .context("HTTP request failed")?;
        check_status(response).await
    }

    /// Stream the asset to `<output>.partial`, then rename into place.
    async fn fetch(&self, asset: &AssetValue, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).await?;
        }
        let temp_path = partial_path(output);

        let response = check_status(
            self.client
                .get(&asset.href)
                .send()
                .await
                .context("HTTP request failed")?,
        )
        .await?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .context("Failed to open output file")?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error reading response chunk")?;
            file.write_all(&chunk)
                .await
                .context("Error writing to file")?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;

        if let Some(expected) = asset.size {
            if downloaded != expected {
                fs::remove_file(&temp_path).await.ok();
                return Err(anyhow!(
                    "Download size mismatch: expected {} bytes, got {}",
                    expected,
                    downloaded
                ));
            }
        }

        fs::rename(&temp_path, output).await?;
        info!(path = %output.display(), bytes = downloaded, "Saved result");
        Ok(())
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!("HTTP error: {} {}", status, body.trim()))
}

/// Existing `.nc` files in the output directory, for `--list` runs.
pub fn list_existing(dir: &Path) -> Result<Vec<PathBuf>> {
    let files = rei_common::search_files(dir, ".nc", "")
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    info!(count = files.len(), dir = %dir.display(), "Using existing NetCDF files");
    Ok(files)
}
