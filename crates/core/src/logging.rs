//! Structured logging infrastructure for Fieldwatch.
//!
//! Log level can be configured via the `RUST_LOG` environment variable and
//! defaults to `info`. The output format comes from the `[logging]` section
//! of the config file.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging in the requested format.
///
/// # Example
/// ```no_run
/// use fieldwatch_core::{logging, LogFormat};
///
/// logging::init_with_format(LogFormat::Json);
/// tracing::info!(service = "fieldwatch-node", "Service started");
/// ```
pub fn init_with_format(format: LogFormat) {
    match format {
        LogFormat::Text => init(),
        LogFormat::Json => init_json(),
    }
}

/// Initialize the logging system with human-readable output.
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize the logging system with JSON output for log aggregation.
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}
