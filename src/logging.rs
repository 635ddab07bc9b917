//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events. Applications that want them on
//! stderr call [`init_logging`] once at startup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `fallback` is used as the filter
/// directive. Returns `false` if a global subscriber was already installed.
pub fn init_logging(fallback: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Installs the subscriber described by the `[logging]` config section.
pub fn init_from_settings(settings: &LoggingSettings) -> bool {
    init_logging(&settings.filter)
}
