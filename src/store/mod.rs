//! Task store: the authoritative in-memory view of all tasks.
//!
//! [`TaskStore`] wraps a [`RecordStore`] and owns the cache of loaded
//! tasks. Every public mutation writes through the record store, persists
//! pending changes, and then replaces the whole cache with a fresh
//! [`fetch_all`](RecordStore::fetch_all). The cache is never patched in
//! place, so after any public operation returns it mirrors the record
//! store's state.
//!
//! # Failure policy
//!
//! Record-store failures are logged and absorbed here:
//!
//! - a failed fetch leaves the cache empty,
//! - a failed create/update/delete is skipped (the following reload shows
//!   the real state),
//! - a failed persist is logged and otherwise ignored.
//!
//! Index-based mutations on a position outside `[0, len)` fail with
//! [`TaskError::IndexOutOfRange`] and leave everything untouched.
//!
//! # Ownership
//!
//! Mutations take `&mut self`: one owner drives the cache, and the borrow
//! checker serializes it. Observers use [`TaskStore::subscribe`].

pub mod backend;
pub mod configured;
pub mod file;
pub mod memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::config::StoreSettings;
use crate::domain::{NewTask, Task, TaskChanges};
use crate::error::TaskError;

pub use backend::{PersistenceError, RecordStore};
pub use configured::ConfiguredRecordStore;
pub use file::JsonFileRecordStore;
pub use memory::InMemoryRecordStore;

/// Cached, observable view over a [`RecordStore`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use todo_sync::store::{InMemoryRecordStore, TaskStore};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut store = TaskStore::open(Arc::new(InMemoryRecordStore::new())).await;
/// store.add("Buy milk").await;
/// store.add("Clean the kitchen").await;
/// store.remove(0).await.unwrap();
///
/// assert_eq!(store.len(), 1);
/// assert_eq!(store.list()[0].name.as_deref(), Some("Clean the kitchen"));
/// assert!(store.remove(5).await.is_err());
/// # });
/// ```
#[derive(Debug)]
pub struct TaskStore<S: RecordStore> {
    records: Arc<S>,
    tasks: Vec<Task>,
    changes: watch::Sender<Vec<Task>>,
}

impl<S: RecordStore> TaskStore<S> {
    /// Creates a store over `records` and loads the cache.
    pub async fn open(records: Arc<S>) -> Self {
        let (changes, _) = watch::channel(Vec::new());
        let mut store = Self {
            records,
            tasks: Vec::new(),
            changes,
        };
        store.reload().await;
        store
    }

    /// The record store this cache is backed by.
    pub fn records(&self) -> Arc<S> {
        Arc::clone(&self.records)
    }

    /// Current cache, in record-store fetch order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    /// Task at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    /// Number of cached tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no tasks are cached.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Subscribes to cache replacements.
    ///
    /// The receiver starts with the current cache marked as seen and is
    /// notified after every reload.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.changes.subscribe()
    }

    /// Adds a local task with default flags, created now.
    pub async fn add(&mut self, name: impl Into<String>) {
        self.add_task(NewTask::local(name)).await;
    }

    /// Adds a local task with explicit completion flag and creation date.
    ///
    /// The `external_id` of `new` is ignored; only the reconciler imports
    /// remote identities.
    pub async fn add_task(&mut self, new: NewTask) {
        let new = NewTask {
            external_id: None,
            ..new
        };
        match self.records.create(new).await {
            Ok(task) => {
                tracing::debug!(task_id = %task.local_id, "task created");
                self.persist().await;
            },
            Err(e) => tracing::error!(error = %e, "failed to create task"),
        }
        self.reload().await;
    }

    /// Deletes the task at `index` and returns it.
    ///
    /// # Errors
    ///
    /// - [`TaskError::IndexOutOfRange`] if `index >= len()`.
    pub async fn remove(&mut self, index: usize) -> Result<Task, TaskError> {
        let task = self.task_at(index)?.clone();
        match self.records.delete(&task.local_id).await {
            Ok(true) => self.persist().await,
            Ok(false) => tracing::warn!(
                task_id = %task.local_id,
                "task already gone from record store"
            ),
            Err(e) => {
                tracing::error!(task_id = %task.local_id, error = %e, "failed to delete task")
            },
        }
        self.reload().await;
        Ok(task)
    }

    /// Renames the task at `index`, keeping its creation date.
    ///
    /// # Errors
    ///
    /// - [`TaskError::IndexOutOfRange`] if `index >= len()`.
    pub async fn update(
        &mut self,
        index: usize,
        new_name: impl Into<String>,
    ) -> Result<(), TaskError> {
        self.apply_at(index, TaskChanges::rename(new_name)).await
    }

    /// Renames the task at `index` and replaces its creation date.
    ///
    /// # Errors
    ///
    /// - [`TaskError::IndexOutOfRange`] if `index >= len()`.
    pub async fn update_dated(
        &mut self,
        index: usize,
        new_name: impl Into<String>,
        new_date: DateTime<Utc>,
    ) -> Result<(), TaskError> {
        self.apply_at(index, TaskChanges::rename(new_name).with_creation_date(new_date))
            .await
    }

    /// Sets the completion flag of the task at `index`.
    ///
    /// # Errors
    ///
    /// - [`TaskError::IndexOutOfRange`] if `index >= len()`.
    pub async fn set_completed(
        &mut self,
        index: usize,
        is_completed: bool,
    ) -> Result<(), TaskError> {
        self.apply_at(index, TaskChanges::completed(is_completed)).await
    }

    /// Flips the completion flag of the task at `index` and returns the new value.
    ///
    /// # Errors
    ///
    /// - [`TaskError::IndexOutOfRange`] if `index >= len()`.
    pub async fn toggle_completed(&mut self, index: usize) -> Result<bool, TaskError> {
        let flipped = !self.task_at(index)?.is_completed;
        self.apply_at(index, TaskChanges::completed(flipped)).await?;
        Ok(flipped)
    }

    /// Returns `true` if a task with this remote id is stored.
    ///
    /// A failed lookup is logged and reported as `false`.
    pub async fn exists(&self, external_id: i64) -> bool {
        match backend::external_id_exists(self.records.as_ref(), external_id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(external_id, error = %e, "failed to check task existence");
                false
            },
        }
    }

    /// Flushes staged record-store changes, logging failures.
    pub async fn persist(&self) {
        if let Err(e) = self.records.persist_pending_changes().await {
            tracing::error!(error = %e, "failed to persist pending changes");
        }
    }

    /// Replaces the cache with a fresh fetch and notifies subscribers.
    ///
    /// A failed fetch is logged and yields an empty cache.
    pub async fn reload(&mut self) {
        self.tasks = match self.records.fetch_all().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch tasks");
                Vec::new()
            },
        };
        tracing::debug!(count = self.tasks.len(), "task cache reloaded");
        self.changes.send_replace(self.tasks.clone());
    }

    fn task_at(&self, index: usize) -> Result<&Task, TaskError> {
        self.tasks.get(index).ok_or(TaskError::IndexOutOfRange {
            index,
            len: self.tasks.len(),
        })
    }

    async fn apply_at(&mut self, index: usize, changes: TaskChanges) -> Result<(), TaskError> {
        let id = self.task_at(index)?.local_id.clone();
        match self.records.update(&id, changes).await {
            Ok(()) => self.persist().await,
            Err(e) => tracing::error!(task_id = %id, error = %e, "failed to update task"),
        }
        self.reload().await;
        Ok(())
    }
}

impl TaskStore<ConfiguredRecordStore> {
    /// Opens the record store selected by `[store]` and loads the cache.
    ///
    /// # Errors
    ///
    /// - [`TaskError::Persistence`] if the configured task file cannot be
    ///   read or decoded.
    pub async fn from_settings(settings: &StoreSettings) -> Result<Self, TaskError> {
        let records = ConfiguredRecordStore::open(settings).await?;
        Ok(Self::open(Arc::new(records)).await)
    }
}
