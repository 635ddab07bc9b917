//! Wire types of the remote task feed.
//!
//! The feed answers a single GET with a page object:
//!
//! ```json
//! { "todos": [{ "id": 1, "todo": "Do something", "completed": false, "userId": 26 }],
//!   "total": 254, "skip": 0, "limit": 30 }
//! ```
//!
//! Records are transient. The reconciler maps each one into a
//! [`NewTask`](crate::domain::NewTask) and never stores them as-is.

use serde::{Deserialize, Serialize};

/// One task as published by the remote feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTaskRecord {
    /// Remote identifier, becomes the local task's `external_id`.
    pub id: i64,

    /// Task text.
    #[serde(rename = "todo")]
    pub text: String,

    /// Completion flag.
    pub completed: bool,

    /// Author on the remote side. Carried but unused.
    #[serde(rename = "userId", default)]
    pub owner_id: i64,
}

/// Envelope returned by the feed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTaskPage {
    /// Records on this page, in feed order.
    pub todos: Vec<RemoteTaskRecord>,
    /// Total records available upstream.
    #[serde(default)]
    pub total: u64,
    /// Offset of this page.
    #[serde(default)]
    pub skip: u64,
    /// Page size requested.
    #[serde(default)]
    pub limit: u64,
}
