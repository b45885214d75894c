//! Download service façade split into focused submodules.
//!
//! The `DownloadService` struct and its methods are organized by domain:
//! - [`submit`] - Job submission, lookup and result resolution
//! - [`lifecycle`] - Shutdown coordination

mod lifecycle;
mod submit;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use submit::parse_url_list;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::JobExecutor;
use crate::media::{AudioSettings, MediaFetcher, NoOpFetcher, YtDlpFetcher};
use crate::registry::JobRegistry;
use crate::types::{Event, HealthInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Main service instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct DownloadService {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Authoritative job store
    pub(crate) registry: JobRegistry,
    /// Background job runner
    pub(crate) executor: JobExecutor,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Cleared once shutdown begins
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl DownloadService {
    /// Create a service with the downloader selected from configuration
    ///
    /// Uses `tools.ytdlp_path` if set, otherwise searches `PATH` for yt-dlp
    /// (unless `tools.search_path` is false). Without a binary every job
    /// fails with a "not supported" error, but the API still runs.
    pub async fn new(config: Config) -> Result<Self> {
        let audio = AudioSettings {
            codec: config.download.audio_codec.clone(),
            quality: config.download.audio_quality.clone(),
        };

        let fetcher: Arc<dyn MediaFetcher> = if let Some(ref path) = config.tools.ytdlp_path {
            Arc::new(YtDlpFetcher::new(path.clone(), audio))
        } else if config.tools.search_path {
            YtDlpFetcher::from_path()
                .map(|f| Arc::new(f.with_audio(audio)) as Arc<dyn MediaFetcher>)
                .unwrap_or_else(|| Arc::new(NoOpFetcher))
        } else {
            Arc::new(NoOpFetcher)
        };

        tracing::info!(
            downloader = fetcher.name(),
            available = fetcher.is_available(),
            "Downloader initialized"
        );
        if !fetcher.is_available() {
            tracing::warn!("yt-dlp not found, every job will fail until it is installed");
        }

        Self::with_fetcher(config, fetcher).await
    }

    /// Create a service around an explicit downloader
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn MediaFetcher>) -> Result<Self> {
        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        if config.uses_default_token() {
            tracing::warn!("Using the default API token, set api.token or WEB_TOKEN");
        }

        let (event_tx, _rx) = broadcast::channel(1000);
        let registry = JobRegistry::new();
        let executor = JobExecutor::new(
            registry.clone(),
            fetcher,
            config.download.download_dir.clone(),
            event_tx.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            registry,
            executor,
            event_tx,
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Subscribe to job events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls more than 1000 events behind gets `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Whether new submissions are accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    /// Health and capability summary
    pub async fn health(&self) -> HealthInfo {
        HealthInfo {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            jobs: self.registry.len().await,
            downloader: self.executor.fetcher_name().to_string(),
            downloader_available: self.executor.fetcher_available(),
        }
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() fails only when nobody is subscribed
        self.event_tx.send(event).ok();
    }
}
