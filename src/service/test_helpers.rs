//! Shared test doubles for the downloader boundary and service setup.

use crate::config::Config;
use crate::error::FetchError;
use crate::media::{FetchRequest, FetchedMedia, MediaFetcher};
use crate::registry::JobRegistry;
use crate::service::DownloadService;
use crate::types::{Job, JobId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// What the scripted downloader does for one URL
#[derive(Clone, Debug)]
pub(crate) enum Script {
    /// Write a file with this name into the job directory
    Succeed(String),
    /// Fail as if yt-dlp exited with an error
    Fail(String),
    /// Report this path without writing anything
    Report(PathBuf),
    /// Panic inside fetch
    Panic,
}

/// Downloader whose behavior is decided per URL
///
/// Unknown URLs fail with "Unsupported URL".
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn succeed(mut self, url: &str, file_name: &str) -> Self {
        self.scripts
            .insert(url.to_string(), Script::Succeed(file_name.to_string()));
        self
    }

    pub(crate) fn fail(mut self, url: &str, message: &str) -> Self {
        self.scripts
            .insert(url.to_string(), Script::Fail(message.to_string()));
        self
    }

    pub(crate) fn report_path(mut self, url: &str, path: PathBuf) -> Self {
        self.scripts.insert(url.to_string(), Script::Report(path));
        self
    }

    pub(crate) fn panic_on(mut self, url: &str) -> Self {
        self.scripts.insert(url.to_string(), Script::Panic);
        self
    }
}

/// Contents written for a scripted file, derived from its name and URL
pub(crate) fn scripted_contents(url: &str, file_name: &str) -> Vec<u8> {
    format!("{url}|{file_name}").into_bytes()
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedMedia, FetchError> {
        match self.scripts.get(&request.url) {
            Some(Script::Succeed(name)) => {
                let path = request.output_dir.join(name);
                tokio::fs::write(&path, scripted_contents(&request.url, name))
                    .await
                    .unwrap();
                Ok(FetchedMedia { path })
            }
            Some(Script::Fail(message)) => Err(FetchError::ToolFailed {
                tool: "yt-dlp".into(),
                exit_code: Some(1),
                message: message.clone(),
            }),
            Some(Script::Report(path)) => Ok(FetchedMedia { path: path.clone() }),
            Some(Script::Panic) => panic!("scripted panic for {}", request.url),
            None => Err(FetchError::ToolFailed {
                tool: "yt-dlp".into(),
                exit_code: Some(1),
                message: format!("ERROR: Unsupported URL: {}", request.url),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Downloader that blocks every fetch until a permit is released
///
/// Each release lets one fetch finish successfully, writing `<n>.mp3` where
/// `n` is derived from the URL's last path segment.
pub(crate) struct GatedFetcher {
    gate: Arc<Semaphore>,
}

impl GatedFetcher {
    pub(crate) fn new() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (Self { gate: gate.clone() }, gate)
    }
}

#[async_trait]
impl MediaFetcher for GatedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedMedia, FetchError> {
        let permit = self.gate.acquire().await.unwrap();
        permit.forget();

        let name = format!(
            "{}.mp3",
            request.url.rsplit('/').next().unwrap_or("media")
        );
        let path = request.output_dir.join(&name);
        tokio::fs::write(&path, scripted_contents(&request.url, &name))
            .await
            .unwrap();
        Ok(FetchedMedia { path })
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Service with a temp download directory and the given downloader
///
/// Returns the service and the tempdir (which must be kept alive).
pub(crate) async fn create_test_service(
    fetcher: Arc<dyn MediaFetcher>,
) -> (DownloadService, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.shutdown_timeout = Duration::from_secs(5);
    config.api.token = "test-token".into();

    let service = DownloadService::with_fetcher(config, fetcher).await.unwrap();
    (service, temp_dir)
}

/// Poll until the job reaches a terminal state (panics after 5s)
pub(crate) async fn wait_for_terminal(registry: &JobRegistry, id: &JobId) -> Job {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let job = registry.get(id).await.unwrap();
        if job.status().is_terminal() {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {id} stuck in {}",
            job.status()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
