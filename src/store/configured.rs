//! Record store chosen by the `[store]` config section.
//!
//! [`ConfiguredRecordStore`] forwards every [`RecordStore`] call to either
//! the in-memory engine or the JSON-file engine, so a [`TaskStore`](super::TaskStore)
//! can be built from config without naming the engine type.

use async_trait::async_trait;

use crate::config::StoreSettings;
use crate::domain::{NewTask, Task, TaskChanges, TaskId};
use crate::store::backend::{PersistenceError, RecordStore};
use crate::store::file::JsonFileRecordStore;
use crate::store::memory::InMemoryRecordStore;

/// Either bundled record store engine.
#[derive(Debug)]
pub enum ConfiguredRecordStore {
    /// Volatile store, used when no path is configured.
    Memory(InMemoryRecordStore),
    /// Durable JSON-file store.
    File(JsonFileRecordStore),
}

impl ConfiguredRecordStore {
    /// Opens the engine selected by `settings`.
    ///
    /// # Errors
    ///
    /// Propagates [`JsonFileRecordStore::open`] failures.
    pub async fn open(settings: &StoreSettings) -> Result<Self, PersistenceError> {
        match &settings.path {
            Some(path) => {
                tracing::debug!(path = ?path, "using JSON file record store");
                Ok(Self::File(JsonFileRecordStore::open(path.clone()).await?))
            },
            None => {
                tracing::debug!("using in-memory record store");
                Ok(Self::Memory(InMemoryRecordStore::new()))
            },
        }
    }

    /// Returns `true` if records survive a restart.
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::File(_))
    }

    fn inner(&self) -> &dyn RecordStore {
        match self {
            Self::Memory(store) => store,
            Self::File(store) => store,
        }
    }
}

#[async_trait]
impl RecordStore for ConfiguredRecordStore {
    async fn create(&self, new: NewTask) -> Result<Task, PersistenceError> {
        self.inner().create(new).await
    }

    async fn fetch_all(&self) -> Result<Vec<Task>, PersistenceError> {
        self.inner().fetch_all().await
    }

    async fn count_by_external_id(&self, external_id: i64) -> Result<usize, PersistenceError> {
        self.inner().count_by_external_id(external_id).await
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, PersistenceError> {
        self.inner().delete(id).await
    }

    async fn update(&self, id: &TaskId, changes: TaskChanges) -> Result<(), PersistenceError> {
        self.inner().update(id, changes).await
    }

    async fn persist_pending_changes(&self) -> Result<(), PersistenceError> {
        self.inner().persist_pending_changes().await
    }
}
