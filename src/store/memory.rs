//! In-memory record store.
//!
//! [`InMemoryRecordStore`] keeps records in an insertion-ordered
//! `IndexMap` behind a `parking_lot::RwLock`. It has no durability:
//! [`persist_pending_changes`](RecordStore::persist_pending_changes) only
//! counts calls, which tests use to check that mutations are persisted.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use todo_sync::store::memory::InMemoryRecordStore;
//! use todo_sync::store::TaskStore;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut store = TaskStore::open(Arc::new(InMemoryRecordStore::new())).await;
//! store.add("Buy milk").await;
//! assert_eq!(store.len(), 1);
//! # });
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::domain::{NewTask, Task, TaskChanges, TaskId};
use crate::store::backend::{PersistenceError, RecordStore};

/// Thread-safe, insertion-ordered in-memory record store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<IndexMap<TaskId, Task>>,
    persist_calls: AtomicUsize,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `tasks`, in order.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let records = tasks
            .into_iter()
            .map(|task| (task.local_id.clone(), task))
            .collect();
        Self {
            records: RwLock::new(records),
            persist_calls: AtomicUsize::new(0),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// How many times pending changes were persisted.
    pub fn persist_count(&self) -> usize {
        self.persist_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, new: NewTask) -> Result<Task, PersistenceError> {
        let task = Task::from_new(TaskId::generate(), new);
        self.records
            .write()
            .insert(task.local_id.clone(), task.clone());
        Ok(task)
    }

    async fn fetch_all(&self) -> Result<Vec<Task>, PersistenceError> {
        Ok(self.records.read().values().cloned().collect())
    }

    async fn count_by_external_id(&self, external_id: i64) -> Result<usize, PersistenceError> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|task| task.external_id == Some(external_id))
            .count())
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, PersistenceError> {
        Ok(self.records.write().shift_remove(id).is_some())
    }

    async fn update(&self, id: &TaskId, changes: TaskChanges) -> Result<(), PersistenceError> {
        let mut records = self.records.write();
        let task = records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound { id: id.clone() })?;
        task.apply(&changes);
        Ok(())
    }

    async fn persist_pending_changes(&self) -> Result<(), PersistenceError> {
        self.persist_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
