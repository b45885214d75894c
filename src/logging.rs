//! Structured logging setup

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,media_dl=debug";

/// Initialize the global tracing subscriber, writing to stderr.
///
/// Honors `RUST_LOG`; falls back to [`DEFAULT_FILTER`]. Fails if a global
/// subscriber is already installed.
pub fn init_logging() -> crate::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| crate::Error::Other(format!("failed to initialize logging: {e}")))?;

    tracing::debug!("logging initialized");
    Ok(())
}
