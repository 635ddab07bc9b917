//! Error types for task store, sync and configuration operations.
//!
//! [`TaskError`] is what public operations return. Lower layers have their
//! own errors ([`PersistenceError`] for the durable record store,
//! [`RemoteFetchError`] for the remote feed) that convert into it.
//!
//! Not every failure reaches the caller. Durable-store failures are logged
//! and absorbed by [`TaskStore`](crate::store::TaskStore), so callers mostly
//! see [`TaskError::IndexOutOfRange`] from the store and
//! [`TaskError::RemoteFetch`] from the reconciler.

use crate::remote::RemoteFetchError;
use crate::store::backend::PersistenceError;

/// Errors surfaced by task operations.
///
/// # Examples
///
/// ```
/// use todo_sync::TaskError;
///
/// let err = TaskError::IndexOutOfRange { index: 3, len: 2 };
/// assert_eq!(err.to_string(), "index 3 out of range for 2 tasks");
/// assert!(err.is_programmer_error());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// A mutation targeted a list position that does not exist (stale index).
    #[error("index {index} out of range for {len} tasks")]
    IndexOutOfRange {
        /// The requested position.
        index: usize,
        /// The cache length at the time of the call.
        len: usize,
    },

    /// The remote task feed could not be fetched or decoded.
    #[error("remote fetch failed: {0}")]
    RemoteFetch(#[from] RemoteFetchError),

    /// The durable record store failed to open.
    ///
    /// Failures after opening are absorbed by the task store.
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// The background import task panicked or was aborted before finishing.
    #[error("sync interrupted: {message}")]
    SyncInterrupted {
        /// Description of the interruption.
        message: String,
    },

    /// The config file contains invalid TOML or does not match the schema.
    #[error("failed to parse config TOML: {source}")]
    ConfigParse {
        #[from]
        source: toml::de::Error,
    },

    /// The config parsed but holds invalid values.
    #[error("config validation error: {message}")]
    ConfigValidation {
        /// What was wrong.
        message: String,
    },

    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ConfigIo {
        source: std::io::Error,
        path: String,
    },
}

impl TaskError {
    /// Returns `true` for errors caused by the caller rather than the environment.
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. })
    }

    /// Short category name, suitable as a structured log field.
    pub fn category(&self) -> &'static str {
        match self {
            Self::IndexOutOfRange { .. } => "index",
            Self::RemoteFetch(_) => "remote",
            Self::Persistence(_) => "persistence",
            Self::SyncInterrupted { .. } => "sync",
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } | Self::ConfigIo { .. } => {
                "config"
            },
        }
    }
}
