//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::sync::atomic::Ordering;

use super::DownloadService;

impl DownloadService {
    /// Gracefully shut down the service
    ///
    /// 1. Stops accepting new submissions (they fail with `ShuttingDown`)
    /// 2. Emits [`Event::Shutdown`]
    /// 3. Waits up to `download.shutdown_timeout` for running jobs
    ///
    /// Jobs still running after the timeout are left alone; they end with the
    /// process.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        self.emit_event(Event::Shutdown);

        let running = self.executor.running();
        if running > 0 {
            tracing::info!(running, "Waiting for running jobs");
        }

        let timeout = self.config.download.shutdown_timeout;
        if self.executor.wait_idle(timeout).await {
            tracing::info!("All running jobs finished");
        } else {
            tracing::warn!(
                still_running = self.executor.running(),
                timeout_secs = timeout.as_secs(),
                "Timeout waiting for jobs to finish, proceeding with shutdown"
            );
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}
