//! No-op downloader for graceful degradation

use super::traits::{FetchRequest, FetchedMedia, MediaFetcher};
use crate::error::FetchError;
use async_trait::async_trait;

/// Downloader used when yt-dlp is not available
///
/// The service still starts and accepts jobs; each job then fails with
/// [`FetchError::NotSupported`] instead of the process refusing to run.
pub struct NoOpFetcher;

#[async_trait]
impl MediaFetcher for NoOpFetcher {
    async fn fetch(&self, _request: &FetchRequest) -> Result<FetchedMedia, FetchError> {
        Err(FetchError::NotSupported(
            "downloading requires the yt-dlp binary. \
             Configure ytdlp_path in config or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }

    fn is_available(&self) -> bool {
        false
    }
}
