//! # media-dl
//!
//! Web front end that runs `yt-dlp` downloads as background jobs.
//!
//! Clients submit a URL (or a text file of URLs), receive a job id right
//! away, poll the job until it is `done` or `error`, then fetch the produced
//! file. Every API route except the landing page requires a shared token.
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, DownloadService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let service = Arc::new(DownloadService::new(config).await?);
//!
//!     let id = service.submit("https://example.com/watch?v=abc", Some("mp3")).await?;
//!     println!("queued job {id}");
//!
//!     media_dl::api::serve_with_shutdown(
//!         service.clone(),
//!         service.get_config(),
//!         media_dl::wait_for_signal(),
//!     )
//!     .await?;
//!     service.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Background job execution
pub mod executor;
/// Logging setup
pub mod logging;
/// External downloader integration
pub mod media;
/// In-memory job registry
pub mod registry;
/// Download service facade
pub mod service;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, Error, ErrorDetail, FetchError, JobError, Result, ToHttpStatus};
pub use executor::JobExecutor;
pub use media::{AudioSettings, FetchRequest, FetchedMedia, MediaFetcher, NoOpFetcher, YtDlpFetcher};
pub use registry::{JobRegistry, Transition};
pub use service::{DownloadService, parse_url_list};
pub use types::{BatchResponse, Event, HealthInfo, Job, JobId, JobInfo, JobState, Status, SubmitResponse};

/// Resolve once SIGTERM or SIGINT (Ctrl+C elsewhere) is received
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve once Ctrl+C is received
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
