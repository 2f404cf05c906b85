//! Logging set-up for a provider process.
//!
//! Logs always go to **stderr**: stdout belongs to whatever plugin host
//! launched the process.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `debug`, `hemmer_simple_provider=debug`)
//!
//! ```bash
//! # Trace every provider operation
//! RUST_LOG=hemmer_simple_provider=debug ./simple-provider
//! ```

use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

const DEFAULT_LEVEL: &str = "info";

/// Build the filter: `RUST_LOG` if set and valid, else `default_level`.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn subscriber(default_level: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
    Registry::default().with(env_filter(default_level)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Initialize the default logging subscriber at `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
///
/// # Example
///
/// ```ignore
/// hemmer_simple_provider::init_logging();
/// tracing::info!("Provider starting");
/// ```
pub fn init_logging() {
    subscriber(DEFAULT_LEVEL).init();
}

/// Initialize logging with a custom default level, used when `RUST_LOG`
/// is not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Try to initialize logging, returning false if already initialized.
pub fn try_init_logging() -> bool {
    subscriber(DEFAULT_LEVEL).try_init().is_ok()
}

#[cfg(test)]
mod tests {
    // The global subscriber can be set once per process, so only
    // `try_init_logging` is exercised here.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("hemmer_simple_provider=debug").is_ok());
        assert!(EnvFilter::try_new("warn,hemmer_simple_provider::provider=trace").is_ok());
    }

    #[test]
    fn test_try_init_is_idempotent() {
        let _ = try_init_logging();
        assert!(!try_init_logging());
    }
}
