//! Error types for media-dl
//!
//! This module provides:
//! - The crate-wide [`Error`] type with nested job and fetch errors
//! - HTTP status code mapping for API integration ([`ToHttpStatus`])
//! - Structured error responses with machine-readable error codes ([`ApiError`])

use crate::types::Status;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.token")
        key: Option<String>,
    },

    /// Missing or mismatched auth token
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Request rejected before any job was created
    #[error("{0}")]
    Validation(String),

    /// Request body exceeded the configured limit
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes
        limit: usize,
    },

    /// Job-related error
    #[error("{0}")]
    Job(#[from] JobError),

    /// External downloader failure
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Job lookup and lifecycle errors
#[derive(Debug, Error)]
pub enum JobError {
    /// No job with this identifier
    #[error("job {id} not found")]
    NotFound {
        /// The job ID that was not found
        id: String,
    },

    /// Result requested before the job reached `done`
    #[error("job {id} not finished (status: {status})")]
    NotReady {
        /// The job ID
        id: String,
        /// Its current status
        status: Status,
    },

    /// Job is done but its file is gone from disk
    #[error("file for job {id} not found")]
    FileMissing {
        /// The job ID
        id: String,
        /// Where the file was expected
        path: PathBuf,
    },

    /// Transition not allowed by the lifecycle
    #[error("cannot move job {id} from {from} to {to}")]
    InvalidTransition {
        /// The job ID
        id: String,
        /// Current status
        from: Status,
        /// Requested status
        to: Status,
    },

    /// Downloader produced a file outside the job's own directory
    #[error("output {path} of job {id} is outside its directory")]
    OutputOutsideJobDir {
        /// The job ID
        id: String,
        /// Offending path
        path: PathBuf,
    },
}

/// Failures reported by the external downloader boundary
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Backend cannot fetch at all (e.g. yt-dlp missing)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Downloader process could not be started
    #[error("failed to execute {tool}: {reason}")]
    Spawn {
        /// Binary that failed to start
        tool: String,
        /// OS error text
        reason: String,
    },

    /// Downloader exited unsuccessfully
    #[error("{tool} exited with {}: {message}", describe_exit(.exit_code))]
    ToolFailed {
        /// Binary that failed
        tool: String,
        /// Exit code, if the process was not killed by a signal
        exit_code: Option<i32>,
        /// Last meaningful line of stderr
        message: String,
    },

    /// Downloader returned no usable media information
    #[error("could not get information about the media")]
    NoInfo,

    /// Produced file could not be located
    #[error("final file not found for: {title}")]
    OutputNotFound {
        /// Title reported by the downloader
        title: String,
    },

    /// Downloader panicked
    #[error("downloader panicked: {0}")]
    Panicked(String),
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("code {code}"),
        None => "signal".to_string(),
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "job_not_ready",
///     "message": "job 3f2a... not finished (status: downloading)",
///     "details": { "job_id": "3f2a...", "status": "downloading" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "job_not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,
            Error::Job(JobError::NotReady { .. }) => 400,

            Error::Unauthorized(_) => 401,

            // 404 Not Found
            Error::Job(JobError::NotFound { .. }) => 404,
            Error::Job(JobError::FileMissing { .. }) => 404,

            Error::Job(JobError::InvalidTransition { .. }) => 409,

            Error::PayloadTooLarge { .. } => 413,

            // 500 Internal Server Error - Server-side issues
            Error::Job(JobError::OutputOutsideJobDir { .. }) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External downloader errors
            Error::Fetch(_) => 502,

            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Unauthorized(_) => "unauthorized",
            Error::Validation(_) => "validation_error",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::Job(e) => match e {
                JobError::NotFound { .. } => "job_not_found",
                JobError::NotReady { .. } => "job_not_ready",
                JobError::FileMissing { .. } => "file_not_found",
                JobError::InvalidTransition { .. } => "invalid_transition",
                JobError::OutputOutsideJobDir { .. } => "output_outside_job_dir",
            },
            Error::Fetch(e) => match e {
                FetchError::NotSupported(_) => "not_supported",
                FetchError::Spawn { .. } => "downloader_spawn_failed",
                FetchError::ToolFailed { .. } => "downloader_failed",
                FetchError::NoInfo => "no_media_info",
                FetchError::OutputNotFound { .. } => "output_not_found",
                FetchError::Panicked(_) => "downloader_panicked",
            },
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Job(JobError::NotFound { id }) => Some(serde_json::json!({
                "job_id": id,
            })),
            Error::Job(JobError::NotReady { id, status }) => Some(serde_json::json!({
                "job_id": id,
                "status": status,
            })),
            Error::Job(JobError::FileMissing { id, .. }) => Some(serde_json::json!({
                "job_id": id,
            })),
            Error::Job(JobError::InvalidTransition { id, from, to }) => Some(serde_json::json!({
                "job_id": id,
                "from": from,
                "to": to,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::PayloadTooLarge { limit } => Some(serde_json::json!({
                "limit_bytes": limit,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
