use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use flotilla::client::{
    fetch_job_results, ArtifactDownloader, DownloadSettings, JobStateResolver,
};
use flotilla::{FlotillaError, Result};

struct FakeResolver {
    results: Vec<String>,
}

#[async_trait]
impl JobStateResolver for FakeResolver {
    async fn get_results(&self, job_id: &str) -> Result<Vec<String>> {
        if job_id == "missing" {
            return Err(FlotillaError::JobNotFound(job_id.to_string()));
        }
        Ok(self.results.clone())
    }
}

#[derive(Default)]
struct FakeDownloader {
    downloaded: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

#[async_trait]
impl ArtifactDownloader for FakeDownloader {
    async fn download(&self, content_ids: &[String], _settings: &DownloadSettings) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.downloaded.lock().await.extend_from_slice(content_ids);
        Ok(())
    }
}

#[tokio::test]
async fn test_fetch_resolves_and_downloads() {
    let resolver = FakeResolver {
        results: vec!["cid-1".to_string(), "cid-2".to_string()],
    };
    let downloader = FakeDownloader::default();
    let downloaded = downloader.downloaded.clone();

    let content_ids = fetch_job_results(
        &resolver,
        &downloader,
        "job-1",
        &DownloadSettings::default(),
    )
    .await
    .unwrap();

    assert_eq!(content_ids, vec!["cid-1", "cid-2"]);
    assert_eq!(*downloaded.lock().await, vec!["cid-1", "cid-2"]);
}

#[tokio::test]
async fn test_fetch_unknown_job_surfaces_resolver_error() {
    let resolver = FakeResolver { results: vec![] };
    let downloader = FakeDownloader::default();

    let err = fetch_job_results(
        &resolver,
        &downloader,
        "missing",
        &DownloadSettings::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FlotillaError::JobNotFound(_)));
}

#[tokio::test]
async fn test_fetch_times_out_on_slow_download() {
    let resolver = FakeResolver {
        results: vec!["cid-1".to_string()],
    };
    let downloader = FakeDownloader {
        delay: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let settings = DownloadSettings {
        timeout_secs: 0,
        output_dir: PathBuf::from("."),
        swarm_addrs: vec![],
    };

    let err = fetch_job_results(&resolver, &downloader, "job-1", &settings)
        .await
        .unwrap_err();

    assert!(matches!(err, FlotillaError::DeadlineExceeded));
}
