//! HTTP implementation of [`RemoteTaskSource`].
//!
//! Issues one `GET` against the feed endpoint and decodes a
//! [`RemoteTaskPage`]. Only the `todos` array is handed on; paging fields
//! are logged and otherwise ignored.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::SyncSettings;
use crate::domain::{RemoteTaskPage, RemoteTaskRecord};
use crate::remote::{RemoteFetchError, RemoteTaskSource};

/// Remote task source backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTaskSource {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl HttpTaskSource {
    /// Creates a source for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// - [`RemoteFetchError::InvalidUrl`] if `endpoint` is not an http(s) URL.
    /// - [`RemoteFetchError::Transport`] if the HTTP client cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RemoteFetchError> {
        let endpoint = Url::parse(endpoint).map_err(|e| RemoteFetchError::InvalidUrl {
            url: endpoint.to_string(),
            message: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(RemoteFetchError::InvalidUrl {
                url: endpoint.to_string(),
                message: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteFetchError::Transport {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    /// Creates a source from the `[sync]` config section.
    pub fn from_settings(settings: &SyncSettings) -> Result<Self, RemoteFetchError> {
        Self::new(&settings.endpoint, settings.timeout())
    }

    /// The feed URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify(err: &reqwest::Error) -> RemoteFetchError {
        if err.is_timeout() {
            RemoteFetchError::Timeout
        } else if let Some(status) = err.status() {
            RemoteFetchError::Status {
                status: status.as_u16(),
            }
        } else {
            RemoteFetchError::Transport {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl RemoteTaskSource for HttpTaskSource {
    async fn fetch_all(&self) -> Result<Vec<RemoteTaskRecord>, RemoteFetchError> {
        tracing::debug!(endpoint = %self.endpoint, "fetching remote tasks");

        let response = self
            .http_client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| Self::classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = %self.endpoint, status = status.as_u16(), "feed request rejected");
            return Err(RemoteFetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| Self::classify(&e))?;
        let page: RemoteTaskPage =
            serde_json::from_slice(&body).map_err(|e| RemoteFetchError::Decode {
                message: e.to_string(),
            })?;

        tracing::debug!(
            received = page.todos.len(),
            total = page.total,
            skip = page.skip,
            limit = page.limit,
            "remote tasks decoded"
        );
        Ok(page.todos)
    }
}
