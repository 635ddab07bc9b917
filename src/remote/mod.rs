//! Remote task source: the network-backed provider of externally authored tasks.
//!
//! [`RemoteTaskSource`] is a single-shot request/response contract: one call
//! to [`fetch_all`](RemoteTaskSource::fetch_all) resolves exactly once with
//! the full list or an error. No streaming, paging or retry.
//!
//! [`StaticTaskSource`] serves a fixed answer and is what tests and offline
//! setups plug in. [`HttpTaskSource`](http::HttpTaskSource) talks to the real
//! feed (feature `http-client`).

#[cfg(feature = "http-client")]
pub mod http;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::RemoteTaskRecord;

#[cfg(feature = "http-client")]
pub use http::HttpTaskSource;

/// Failures fetching or decoding the remote feed.
///
/// Surfaced verbatim to the reconciler's caller. Never retried by this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteFetchError {
    /// The configured endpoint is not a usable URL.
    #[error("invalid feed URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    /// Connection-level failure (DNS, TCP, TLS).
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The feed answered with a non-success HTTP status.
    #[error("feed returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The response body is not a valid task page.
    #[error("failed to decode feed: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },

    /// The source is unavailable for a non-network reason.
    #[error("source unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

impl RemoteFetchError {
    /// Short category name for structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "url",
            Self::Transport { .. } => "transport",
            Self::Timeout => "timeout",
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}

/// Provider of remote task records.
#[async_trait]
pub trait RemoteTaskSource: Send + Sync {
    /// Fetches every remote record, in feed order.
    async fn fetch_all(&self) -> Result<Vec<RemoteTaskRecord>, RemoteFetchError>;
}

/// Remote source that answers with a fixed, replaceable result.
///
/// # Examples
///
/// ```
/// use todo_sync::domain::RemoteTaskRecord;
/// use todo_sync::remote::{RemoteTaskSource, StaticTaskSource};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let source = StaticTaskSource::new(vec![RemoteTaskRecord {
///     id: 1,
///     text: "Call mom".to_string(),
///     completed: false,
///     owner_id: 3,
/// }]);
/// assert_eq!(source.fetch_all().await.unwrap().len(), 1);
/// assert_eq!(source.fetch_count(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct StaticTaskSource {
    response: Mutex<Result<Vec<RemoteTaskRecord>, RemoteFetchError>>,
    fetches: Mutex<usize>,
}

impl StaticTaskSource {
    /// A source that always returns `records`.
    pub fn new(records: Vec<RemoteTaskRecord>) -> Self {
        Self {
            response: Mutex::new(Ok(records)),
            fetches: Mutex::new(0),
        }
    }

    /// A source that always fails with `error`.
    pub fn failing(error: RemoteFetchError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            fetches: Mutex::new(0),
        }
    }

    /// Replaces the answer given by subsequent fetches.
    pub fn set_response(&self, response: Result<Vec<RemoteTaskRecord>, RemoteFetchError>) {
        *self.response.lock() = response;
    }

    /// How many times [`fetch_all`](RemoteTaskSource::fetch_all) was called.
    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock()
    }
}

#[async_trait]
impl RemoteTaskSource for StaticTaskSource {
    async fn fetch_all(&self) -> Result<Vec<RemoteTaskRecord>, RemoteFetchError> {
        *self.fetches.lock() += 1;
        self.response.lock().clone()
    }
}
