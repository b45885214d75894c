//! yt-dlp backed downloader using the external binary

use super::locate::locate_output;
use super::traits::{FetchRequest, FetchedMedia, MediaFetcher};
use crate::error::FetchError;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;

const TOOL: &str = "yt-dlp";

/// Printed once per downloaded item, before post-processing
const INFO_TEMPLATE: &str = "%(.{title,ext})j";

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Transcoding settings for audio-only jobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSettings {
    /// Target codec, also the expected file extension (e.g. "mp3")
    pub codec: String,
    /// Quality passed to `--audio-quality` (e.g. "192K")
    pub quality: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            codec: "mp3".to_string(),
            quality: "192K".to_string(),
        }
    }
}

/// Downloader that runs the `yt-dlp` binary
///
/// # Examples
///
/// ```no_run
/// use media_dl::media::{AudioSettings, YtDlpFetcher};
/// use std::path::PathBuf;
///
/// // Explicit path
/// let fetcher = YtDlpFetcher::new(PathBuf::from("/usr/local/bin/yt-dlp"), AudioSettings::default());
///
/// // Or auto-discover from PATH
/// let fetcher = YtDlpFetcher::from_path().expect("yt-dlp not in PATH");
/// ```
pub struct YtDlpFetcher {
    binary_path: PathBuf,
    audio: AudioSettings,
}

/// The JSON line produced by [`INFO_TEMPLATE`]
#[derive(Debug, Deserialize)]
struct InfoLine {
    title: Option<String>,
    ext: Option<String>,
}

impl YtDlpFetcher {
    /// Create a fetcher for an explicit binary path
    pub fn new(binary_path: PathBuf, audio: AudioSettings) -> Self {
        Self { binary_path, audio }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which(TOOL)
            .ok()
            .map(|path| Self::new(path, AudioSettings::default()))
    }

    /// Replace the audio transcoding settings
    pub fn with_audio(mut self, audio: AudioSettings) -> Self {
        self.audio = audio;
        self
    }

    /// Command-line arguments for one request (binary name excluded)
    fn build_args(&self, request: &FetchRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--no-playlist",
            "--no-progress",
            "--no-warnings",
            "--no-simulate",
            "--print",
            INFO_TEMPLATE,
            "-P",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(request.output_dir.clone().into_os_string());
        args.push("-o".into());
        args.push(OUTPUT_TEMPLATE.into());

        if request.audio_only {
            args.extend(
                [
                    "-f",
                    "bestaudio/best",
                    "-x",
                    "--audio-format",
                    self.audio.codec.as_str(),
                    "--audio-quality",
                    self.audio.quality.as_str(),
                ]
                .iter()
                .map(OsString::from),
            );
        } else {
            args.extend(["-f", "bestvideo+bestaudio/best"].iter().map(OsString::from));
        }

        // Never let the URL be read as an option
        args.push("--".into());
        args.push(request.url.clone().into());
        args
    }

    /// Extension of the final file for this request
    fn expected_extension(&self, request: &FetchRequest, info: &InfoLine) -> String {
        if request.audio_only {
            self.audio.codec.clone()
        } else {
            info.ext.clone().unwrap_or_else(|| "mp4".to_string())
        }
    }
}

/// Last JSON object line on stdout
fn parse_info_line(stdout: &[u8]) -> Option<InfoLine> {
    String::from_utf8_lossy(stdout)
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str::<InfoLine>(line).ok())
}

/// Last non-empty stderr line, preferring yt-dlp's `ERROR:` lines
fn summarize_stderr(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_else(|| "no error output".to_string())
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedMedia, FetchError> {
        tracing::debug!(
            url = %request.url,
            audio_only = request.audio_only,
            dir = %request.output_dir.display(),
            "Running yt-dlp"
        );

        let output = Command::new(&self.binary_path)
            .args(self.build_args(request))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FetchError::Spawn {
                tool: TOOL.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(FetchError::ToolFailed {
                tool: TOOL.to_string(),
                exit_code: output.status.code(),
                message: summarize_stderr(&output.stderr),
            });
        }

        let info = parse_info_line(&output.stdout).ok_or(FetchError::NoInfo)?;
        let title = info.title.clone().ok_or(FetchError::NoInfo)?;
        let ext = self.expected_extension(request, &info);

        let path = locate_output(&request.output_dir, &title, &ext).await?;
        Ok(FetchedMedia { path })
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
