//! Traits and types for the external downloader

use crate::error::FetchError;
use async_trait::async_trait;
use std::path::PathBuf;

/// One fetch to perform
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Directory the produced file must be written into
    pub output_dir: PathBuf,
    /// Source URL
    pub url: String,
    /// Extract audio only instead of best video+audio
    pub audio_only: bool,
}

/// Successful fetch result
#[must_use]
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    /// Path of the produced file
    pub path: PathBuf,
}

/// Interface to the tool that actually fetches and transcodes media
///
/// Implementations return an explicit `Result` for every outcome; callers
/// never have to catch anything else.
///
/// # Examples
///
/// ```no_run
/// use media_dl::media::{FetchRequest, MediaFetcher, NoOpFetcher};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() {
/// let fetcher = NoOpFetcher;
/// let request = FetchRequest {
///     output_dir: PathBuf::from("/tmp/job"),
///     url: "https://example.com/v".into(),
///     audio_only: false,
/// };
/// assert!(fetcher.fetch(&request).await.is_err());
/// # }
/// ```
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch `request.url` into `request.output_dir`
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if:
    /// - The backend is unavailable
    /// - The tool cannot be started or exits unsuccessfully
    /// - No media information comes back
    /// - The produced file cannot be located
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedMedia, FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    /// Whether this backend can fetch anything at all
    fn is_available(&self) -> bool {
        true
    }
}
