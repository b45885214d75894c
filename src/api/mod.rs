//! REST API server module
//!
//! Serves the landing page and the token-protected job API, plus health,
//! event stream and OpenAPI endpoints.

use crate::{Config, DownloadService, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error_response;
pub mod extract;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Public
/// - `GET /` - Landing page with the submission form
///
/// ## Jobs (token required)
/// - `POST /api/download` - Submit one URL (JSON or form: `url`, `formato`)
/// - `POST /api/upload_txt` - Submit one audio job per line of an uploaded file
/// - `GET /api/status/:job_id` - Current job record
/// - `GET /api/result/:job_id` - Download the produced file
///
/// ## System (token required)
/// - `GET /api/health` - Health check
/// - `GET /api/events` - Server-sent events stream
/// - `GET /api/openapi.json` - OpenAPI specification
pub fn create_router(service: Arc<DownloadService>, config: Arc<Config>) -> Router {
    let state = AppState::new(service, config.clone());
    let auth_state = auth::TokenAuth::new(config.api.token.clone(), config.api.max_body_bytes);

    // route_layer only wraps matched routes, so unknown paths still 404
    let api = Router::new()
        .route("/api/download", post(routes::submit_download))
        .route("/api/upload_txt", post(routes::upload_txt))
        .route("/api/status/:job_id", get(routes::get_status))
        .route("/api/result/:job_id", get(routes::get_result))
        .route("/api/health", get(routes::health_check))
        .route("/api/events", get(routes::event_stream))
        .route("/api/openapi.json", get(routes::openapi_spec))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            auth::require_token,
        ));

    let router = Router::new()
        .route("/", get(routes::index))
        .merge(api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.api.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// # Arguments
///
/// * `origins` - List of allowed origins (supports "*" for any origin)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API until `shutdown` resolves, then finish in-flight requests
///
/// # Example
///
/// ```no_run
/// use media_dl::{Config, DownloadService};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let service = Arc::new(DownloadService::new((*config).clone()).await?);
///
/// media_dl::api::serve_with_shutdown(service, config, media_dl::wait_for_signal()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve_with_shutdown<F>(
    service: Arc<DownloadService>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(service, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(bind_address),
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
