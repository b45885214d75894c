//! Core types for media-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Output format that selects audio-only extraction
pub const AUDIO_FORMAT: &str = "mp3";

/// Unique identifier for a job
///
/// Rendered as 32 lowercase hex characters, which makes it safe both as a URL
/// path segment and as a directory name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh random identifier (UUID v4)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Accepted and waiting for the executor
    Queued,
    /// External downloader is running
    Downloading,
    /// Output file produced
    Done,
    /// Failed with error
    Error,
}

impl Status {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Done | Status::Error)
    }

    /// Whether `queued → downloading → {done | error}` allows moving to `next`
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Queued, Status::Downloading)
                | (Status::Downloading, Status::Done)
                | (Status::Downloading, Status::Error)
        )
    }

    /// Lowercase name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Queued => "queued",
            Status::Downloading => "downloading",
            Status::Done => "done",
            Status::Error => "error",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a job together with the data each state carries
///
/// `Done` is the only state holding an output path and title, and `Error` the
/// only one holding a message, so those fields cannot exist in any other state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobState {
    /// Accepted and waiting for the executor
    Queued,
    /// External downloader is running
    Downloading,
    /// Output file produced
    Done {
        /// Absolute path of the produced file
        output_path: PathBuf,
        /// Produced file name without extension
        title: String,
    },
    /// Failed with error
    Error {
        /// Human-readable failure cause
        message: String,
    },
}

impl JobState {
    /// Status tag of this state
    pub fn status(&self) -> Status {
        match self {
            JobState::Queued => Status::Queued,
            JobState::Downloading => Status::Downloading,
            JobState::Done { .. } => Status::Done,
            JobState::Error { .. } => Status::Error,
        }
    }
}

/// One submitted download request and its current state
#[derive(Clone, Debug)]
pub struct Job {
    /// Job identifier
    pub id: JobId,
    /// Source URL
    pub url: String,
    /// Requested output format (lowercase)
    pub format: String,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state
    pub state: JobState,
}

impl Job {
    /// Create a queued job
    pub fn new(id: JobId, url: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            format: format.into(),
            created_at: Utc::now(),
            state: JobState::Queued,
        }
    }

    /// Current status
    pub fn status(&self) -> Status {
        self.state.status()
    }

    /// Whether the downloader should extract audio only
    pub fn is_audio(&self) -> bool {
        self.format == AUDIO_FORMAT
    }

    /// Produced file path, only once done
    pub fn output_path(&self) -> Option<&PathBuf> {
        match &self.state {
            JobState::Done { output_path, .. } => Some(output_path),
            _ => None,
        }
    }

    /// Produced title, only once done
    pub fn title(&self) -> Option<&str> {
        match &self.state {
            JobState::Done { title, .. } => Some(title),
            _ => None,
        }
    }

    /// Failure cause, only once failed
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            JobState::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Job record as returned by the status endpoint
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobInfo {
    /// Job identifier
    pub id: JobId,
    /// Current status
    pub status: Status,
    /// Source URL
    pub url: String,
    /// Requested output format
    pub format: String,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Absolute path of the produced file (done only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub output_path: Option<PathBuf>,
    /// Produced file name without extension (done only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Failure cause (error only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&Job> for JobInfo {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status(),
            url: job.url.clone(),
            format: job.format.clone(),
            created_at: job.created_at,
            output_path: job.output_path().cloned(),
            title: job.title().map(str::to_string),
            error_message: job.error_message().map(str::to_string),
        }
    }
}

/// Event emitted during the job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted
    Queued {
        /// Job ID
        id: JobId,
        /// Source URL
        url: String,
    },

    /// Executor picked the job up
    Downloading {
        /// Job ID
        id: JobId,
    },

    /// Output file produced
    Completed {
        /// Job ID
        id: JobId,
        /// Final path
        path: PathBuf,
        /// Produced title
        title: String,
    },

    /// Job failed
    Failed {
        /// Job ID
        id: JobId,
        /// Error message
        error: String,
    },

    /// Service is shutting down
    Shutdown,
}

impl Event {
    /// SSE event name
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Queued { .. } => "queued",
            Event::Downloading { .. } => "downloading",
            Event::Completed { .. } => "completed",
            Event::Failed { .. } => "failed",
            Event::Shutdown => "shutdown",
        }
    }
}

/// Response body of POST /api/download
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    /// Identifier of the created job
    pub job_id: JobId,
}

/// Response body of POST /api/upload_txt
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchResponse {
    /// Identifiers of the created jobs, in input order
    pub jobs: Vec<JobId>,
}

/// Service health and capability summary
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthInfo {
    /// Always "ok" when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Number of jobs in the registry
    pub jobs: usize,
    /// Name of the external downloader backend
    pub downloader: String,
    /// Whether the backend can actually fetch media
    pub downloader_available: bool,
}
