//! Tracing initialization from the logging configuration section.
//!
//! The configured level is the default; an explicit `RUST_LOG` still wins so
//! a single run can be turned up without editing config. All diagnostics go
//! to stderr, keeping stdout free for status lines and command output.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::domain::models::LoggingConfig;

/// Initialize the global tracing subscriber. Call once, from the binary.
pub fn init_tracing(config: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(base_filter(&config.level));
    if config.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// The configured level as a filter, unless the environment overrides it.
fn base_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
