//! Observability infrastructure for Squeeze.
//!
//! Structured logging with consistent spans for compaction runs and the
//! per-directory grouping work beneath them.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops. Logs go to stderr, leaving stdout to command output.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `squeeze_core=debug`)
///
/// # Example
///
/// ```rust
/// use squeeze_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                let _ = tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .try_init();
            }
            LogFormat::Pretty => {
                let _ = tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty().with_writer(std::io::stderr))
                    .try_init();
            }
        }
    });
}

/// Creates a span covering one compaction run.
///
/// # Example
///
/// ```rust
/// use squeeze_core::observability::run_span;
///
/// let span = run_span("plan", "/warehouse/events", "/warehouse/compacted");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn run_span(operation: &str, source: &str, target: &str) -> Span {
    tracing::info_span!("compaction", op = operation, source = source, target = target)
}

/// Creates a span for the grouping work of one directory.
#[must_use]
pub fn grouping_span(directory: &str, threshold_in_bytes: u64) -> Span {
    tracing::debug_span!(
        "grouping",
        directory = directory,
        threshold_in_bytes = threshold_in_bytes,
    )
}
