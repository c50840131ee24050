//! Result-fetch boundary.
//!
//! Fetching a job's results is two collaborations: a resolver that maps
//! a job id to result content identifiers, and a downloader that
//! materializes those identifiers into an output directory. Both are
//! traits here; the artifact substrate behind them is out of scope.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FlotillaError, Result};

/// Flags governing a result download.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub timeout_secs: u64,
    pub output_dir: PathBuf,
    pub swarm_addrs: Vec<String>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            output_dir: PathBuf::from("."),
            swarm_addrs: Vec::new(),
        }
    }
}

/// Resolves a job to the content identifiers of its results.
#[async_trait]
pub trait JobStateResolver: Send + Sync {
    async fn get_results(&self, job_id: &str) -> Result<Vec<String>>;
}

/// Fetches result artifacts by content identifier.
#[async_trait]
pub trait ArtifactDownloader: Send + Sync {
    async fn download(&self, content_ids: &[String], settings: &DownloadSettings) -> Result<()>;
}

/// Fetch a job's results: resolve content ids, then download them within
/// the configured timeout. Returns the resolved ids.
pub async fn fetch_job_results(
    resolver: &dyn JobStateResolver,
    downloader: &dyn ArtifactDownloader,
    job_id: &str,
    settings: &DownloadSettings,
) -> Result<Vec<String>> {
    tracing::info!(job_id, "Fetching results of job");

    let content_ids = resolver.get_results(job_id).await?;

    tokio::time::timeout(
        Duration::from_secs(settings.timeout_secs),
        downloader.download(&content_ids, settings),
    )
    .await
    .map_err(|_| FlotillaError::DeadlineExceeded)??;

    Ok(content_ids)
}
