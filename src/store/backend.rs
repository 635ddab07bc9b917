//! Durable record store trait and its error type.
//!
//! The [`RecordStore`] trait is the contract every persistence engine
//! implements: [`create`](RecordStore::create), [`fetch_all`](RecordStore::fetch_all),
//! [`count_by_external_id`](RecordStore::count_by_external_id),
//! [`delete`](RecordStore::delete), [`update`](RecordStore::update) and
//! [`persist_pending_changes`](RecordStore::persist_pending_changes).
//!
//! Cache management, reload policy and error absorption do **not** belong
//! here. Record stores are dumb; that logic lives in
//! [`TaskStore`](crate::store::TaskStore) and
//! [`SyncReconciler`](crate::sync::SyncReconciler).
//!
//! # Ordering
//!
//! [`fetch_all`](RecordStore::fetch_all) returns tasks in whatever order the
//! engine keeps them. The bundled engines keep insertion order, but callers
//! must not rely on a particular sort.
//!
//! # Pending changes
//!
//! Mutations may be staged until [`persist_pending_changes`](RecordStore::persist_pending_changes)
//! is called. Staged changes are visible to reads on the same store
//! immediately; persisting only affects durability.

use async_trait::async_trait;

use crate::domain::{NewTask, Task, TaskChanges, TaskId};

/// Errors raised by a durable record store.
///
/// # Examples
///
/// ```
/// use todo_sync::store::backend::PersistenceError;
/// use todo_sync::domain::TaskId;
///
/// let err = PersistenceError::NotFound { id: TaskId::from("t-1".to_string()) };
/// assert!(err.to_string().contains("t-1"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The targeted record does not exist.
    #[error("record not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: TaskId,
    },

    /// Reading or writing the underlying file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Records could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other engine-specific failure.
    #[error("backend error: {message}")]
    Backend {
        /// Human-readable description of the failure.
        message: String,
    },
}

/// Durable storage for task records.
///
/// Implementations must be `Send + Sync`: the sync reconciler queries and
/// inserts from a background task while the owning [`TaskStore`](crate::store::TaskStore)
/// stays on the caller's sequence.
///
/// No operation here enforces uniqueness of `external_id`. The reconciler's
/// existence check is the only guard.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record, assigning its [`TaskId`].
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Backend`] or [`PersistenceError::Io`] on engine failure.
    async fn create(&self, new: NewTask) -> Result<Task, PersistenceError>;

    /// Returns every record in engine order.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Serialization`] or [`PersistenceError::Io`] on read failure.
    async fn fetch_all(&self) -> Result<Vec<Task>, PersistenceError>;

    /// Counts records whose `external_id` equals `external_id`.
    async fn count_by_external_id(&self, external_id: i64) -> Result<usize, PersistenceError>;

    /// Deletes a record. Returns `false` if it did not exist.
    async fn delete(&self, id: &TaskId) -> Result<bool, PersistenceError>;

    /// Applies `changes` to an existing record.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::NotFound`] if no record has this id.
    async fn update(&self, id: &TaskId, changes: TaskChanges) -> Result<(), PersistenceError>;

    /// Flushes staged mutations. A no-op when nothing changed.
    async fn persist_pending_changes(&self) -> Result<(), PersistenceError>;
}

/// Returns `true` if any record carries the given external id.
pub async fn external_id_exists<S: RecordStore + ?Sized>(
    records: &S,
    external_id: i64,
) -> Result<bool, PersistenceError> {
    Ok(records.count_by_external_id(external_id).await? > 0)
}
