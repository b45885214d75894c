//! External media downloader boundary
//!
//! Fetching and transcoding is delegated to an external tool behind the
//! [`MediaFetcher`] trait. Implementations:
//!
//! - [`YtDlpFetcher`]: drives the `yt-dlp` binary
//! - [`NoOpFetcher`]: stand-in when no binary is available; every fetch fails
//!
//! ## Usage
//!
//! ```no_run
//! use media_dl::media::{FetchRequest, MediaFetcher, YtDlpFetcher};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = YtDlpFetcher::from_path().expect("yt-dlp not found");
//!
//!     let request = FetchRequest {
//!         output_dir: PathBuf::from("downloads/job"),
//!         url: "https://example.com/watch?v=1".to_string(),
//!         audio_only: true,
//!     };
//!     let media = fetcher.fetch(&request).await?;
//!     println!("saved to {}", media.path.display());
//!     Ok(())
//! }
//! ```

mod locate;
mod noop;
mod traits;
mod ytdlp;

pub use locate::{is_partial_file, locate_output};
pub use noop::NoOpFetcher;
pub use traits::{FetchRequest, FetchedMedia, MediaFetcher};
pub use ytdlp::{AudioSettings, YtDlpFetcher};
