//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`jobs`] - Submission, status and result retrieval
//! - [`system`] - Landing page, health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod jobs;
mod system;

// Handlers are addressed as `routes::function_name`
pub use jobs::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /api/download (JSON or urlencoded form)
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadRequest {
    /// Source URL
    pub url: Option<String>,
    /// Output format, "mp3" for audio only (default: "mp3")
    pub formato: Option<String>,
}

/// Multipart form field holding the uploaded URL list
pub const UPLOAD_FIELD: &str = "file";
