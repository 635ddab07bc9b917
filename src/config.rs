//! TOML-based application configuration.
//!
//! # Example TOML
//!
//! ```toml
//! [store]
//! path = "/var/lib/todo/tasks.json"
//!
//! [sync]
//! endpoint = "https://dummyjson.com/todos"
//! timeout_ms = 5000
//! enabled = true
//!
//! [logging]
//! filter = "todo_sync=debug"
//! ```
//!
//! Every section is optional. Without `[store].path` the in-memory record
//! store is used.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TaskError;

/// Default feed endpoint.
pub const DEFAULT_SYNC_ENDPOINT: &str = "https://dummyjson.com/todos";

/// Default per-request timeout for the feed: 10 seconds.
pub const DEFAULT_SYNC_TIMEOUT_MS: u64 = 10_000;

/// Default tracing filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TodoConfig {
    /// Durable store settings.
    #[serde(default)]
    pub store: StoreSettings,
    /// Remote feed settings.
    #[serde(default)]
    pub sync: SyncSettings,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// `[store]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreSettings {
    /// JSON file for the durable store. `None` selects the in-memory store.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[sync]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyncSettings {
    /// Feed URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Whether sync should run at all. When `false`,
    /// `SyncReconciler::from_settings` builds no reconciler.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SyncSettings {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
            enabled: default_enabled(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `tracing-subscriber` filter directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_SYNC_ENDPOINT.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_SYNC_TIMEOUT_MS
}

fn default_enabled() -> bool {
    true
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl TodoConfig {
    /// Parses and validates a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, TaskError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    ///
    /// Returns [`TaskError::ConfigIo`] if the file cannot be read,
    /// [`TaskError::ConfigParse`] if the TOML is malformed, or
    /// [`TaskError::ConfigValidation`] if validation fails.
    pub fn load(path: &Path) -> Result<Self, TaskError> {
        let content = std::fs::read_to_string(path).map_err(|source| TaskError::ConfigIo {
            source,
            path: path.display().to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Checks semantic constraints that serde cannot express.
    ///
    /// A disabled `[sync]` section is not validated.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.sync.enabled {
            let url =
                Url::parse(&self.sync.endpoint).map_err(|e| TaskError::ConfigValidation {
                    message: format!("sync.endpoint '{}' is not a URL: {e}", self.sync.endpoint),
                })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(TaskError::ConfigValidation {
                    message: format!("sync.endpoint must be http or https, got '{}'", url.scheme()),
                });
            }
            if self.sync.timeout_ms == 0 {
                return Err(TaskError::ConfigValidation {
                    message: "sync.timeout_ms must be greater than 0".to_string(),
                });
            }
        }

        if self
            .store
            .path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(TaskError::ConfigValidation {
                message: "store.path must not be empty".to_string(),
            });
        }

        if self.logging.filter.trim().is_empty() {
            return Err(TaskError::ConfigValidation {
                message: "logging.filter must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
