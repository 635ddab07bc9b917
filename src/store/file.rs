//! JSON-file record store.
//!
//! [`JsonFileRecordStore`] keeps the working set in memory and writes it to
//! a single JSON file when [`persist_pending_changes`](RecordStore::persist_pending_changes)
//! is called. Mutations are staged until then; persisting a clean store
//! does not touch the disk.
//!
//! Writes go to `<path>.tmp` first and are renamed over the target, so a
//! crash mid-write leaves the previous file intact.
//!
//! Persists on one store are serialized, so the file always holds the
//! latest snapshot. Multiple stores pointing at the same path will
//! overwrite each other.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::domain::{NewTask, Task, TaskChanges, TaskId};
use crate::store::backend::{PersistenceError, RecordStore};

#[derive(Debug, Default)]
struct FileState {
    records: IndexMap<TaskId, Task>,
    /// Bumped on every staged mutation.
    generation: u64,
    /// Generation last written to disk.
    persisted_generation: u64,
}

impl FileState {
    fn touch(&mut self) {
        self.generation += 1;
    }

    fn is_dirty(&self) -> bool {
        self.generation != self.persisted_generation
    }
}

/// Durable record store backed by a JSON file.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    state: RwLock<FileState>,
    /// Held for a whole snapshot-write-rename cycle.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileRecordStore {
    /// Opens the store at `path`, loading existing records.
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first persist.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Io`] if the file exists but cannot be read.
    /// - [`PersistenceError::Serialization`] if the file is not a JSON task list.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let tasks: Vec<Task> = serde_json::from_slice(&bytes)?;
                tracing::debug!(path = ?path, records = tasks.len(), "loaded task file");
                tasks
                    .into_iter()
                    .map(|task| (task.local_id.clone(), task))
                    .collect()
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?path, "task file not found, starting empty");
                IndexMap::new()
            },
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: RwLock::new(FileState {
                records,
                ..FileState::default()
            }),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if there are staged changes not yet on disk.
    pub fn has_pending_changes(&self) -> bool {
        self.state.read().is_dirty()
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn create(&self, new: NewTask) -> Result<Task, PersistenceError> {
        let task = Task::from_new(TaskId::generate(), new);
        let mut state = self.state.write();
        state.records.insert(task.local_id.clone(), task.clone());
        state.touch();
        Ok(task)
    }

    async fn fetch_all(&self) -> Result<Vec<Task>, PersistenceError> {
        Ok(self.state.read().records.values().cloned().collect())
    }

    async fn count_by_external_id(&self, external_id: i64) -> Result<usize, PersistenceError> {
        Ok(self
            .state
            .read()
            .records
            .values()
            .filter(|task| task.external_id == Some(external_id))
            .count())
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, PersistenceError> {
        let mut state = self.state.write();
        let removed = state.records.shift_remove(id).is_some();
        if removed {
            state.touch();
        }
        Ok(removed)
    }

    async fn update(&self, id: &TaskId, changes: TaskChanges) -> Result<(), PersistenceError> {
        let mut state = self.state.write();
        let task = state
            .records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound { id: id.clone() })?;
        task.apply(&changes);
        state.touch();
        Ok(())
    }

    async fn persist_pending_changes(&self) -> Result<(), PersistenceError> {
        // Overlapping persists would otherwise race their renames.
        let _writing = self.write_lock.lock().await;

        // The state lock is never held across an await.
        let (bytes, generation) = {
            let state = self.state.read();
            if !state.is_dirty() {
                return Ok(());
            }
            let tasks: Vec<&Task> = state.records.values().collect();
            (serde_json::to_vec_pretty(&tasks)?, state.generation)
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        let mut state = self.state.write();
        state.persisted_generation = state.persisted_generation.max(generation);
        tracing::debug!(
            path = ?self.path,
            records = state.records.len(),
            "persisted task file"
        );
        Ok(())
    }
}
