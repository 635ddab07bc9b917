//! Integration tests for TaskStore.
//!
//! Tests cover CRUD through the cache, reload semantics, change notification
//! and the absorption of record-store failures. Organized into module blocks
//! per concern.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use todo_sync::domain::{NewTask, Task, TaskChanges, TaskId};
use todo_sync::config::StoreSettings;
use todo_sync::store::{
    InMemoryRecordStore, JsonFileRecordStore, PersistenceError, RecordStore, TaskStore,
};
use todo_sync::TaskError;

async fn memory_store() -> TaskStore<InMemoryRecordStore> {
    TaskStore::open(Arc::new(InMemoryRecordStore::new())).await
}

/// Record store wrapper whose operations can be switched to fail.
#[derive(Debug, Default)]
struct FlakyRecordStore {
    inner: InMemoryRecordStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_persist: AtomicBool,
}

impl FlakyRecordStore {
    fn broken() -> PersistenceError {
        PersistenceError::Backend {
            message: "injected failure".to_string(),
        }
    }

    fn check(flag: &AtomicBool) -> Result<(), PersistenceError> {
        if flag.load(Ordering::SeqCst) {
            Err(Self::broken())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn create(&self, new: NewTask) -> Result<Task, PersistenceError> {
        Self::check(&self.fail_writes)?;
        self.inner.create(new).await
    }

    async fn fetch_all(&self) -> Result<Vec<Task>, PersistenceError> {
        Self::check(&self.fail_reads)?;
        self.inner.fetch_all().await
    }

    async fn count_by_external_id(&self, external_id: i64) -> Result<usize, PersistenceError> {
        Self::check(&self.fail_reads)?;
        self.inner.count_by_external_id(external_id).await
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, PersistenceError> {
        Self::check(&self.fail_writes)?;
        self.inner.delete(id).await
    }

    async fn update(&self, id: &TaskId, changes: TaskChanges) -> Result<(), PersistenceError> {
        Self::check(&self.fail_writes)?;
        self.inner.update(id, changes).await
    }

    async fn persist_pending_changes(&self) -> Result<(), PersistenceError> {
        Self::check(&self.fail_persist)?;
        self.inner.persist_pending_changes().await
    }
}

// ─── CRUD Tests ─────────────────────────────────────────────────────────────

mod crud_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_adds_are_listed_with_unique_ids() {
        let mut store = memory_store().await;
        for name in ["one", "two", "three"] {
            store.add(name).await;
        }

        let names: Vec<_> = store.list().iter().map(|t| t.title().to_string()).collect();
        assert_eq!(names, ["one", "two", "three"]);

        let ids: HashSet<_> = store.list().iter().map(|t| t.local_id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_add_task_with_explicit_fields() {
        let mut store = memory_store().await;
        let date = chrono::DateTime::parse_from_rfc3339("2025-01-04T09:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        store
            .add_task(
                NewTask::local("Done already")
                    .with_completed(true)
                    .with_creation_date(date),
            )
            .await;

        let task = &store.list()[0];
        assert!(task.is_completed);
        assert_eq!(task.creation_date, date);
        assert_eq!(task.formatted_date(), "04.01.2025");
    }

    #[tokio::test]
    async fn test_remove_drops_exactly_one() {
        let mut store = memory_store().await;
        for name in ["a", "b", "c"] {
            store.add(name).await;
        }
        let target = store.list()[1].local_id.clone();

        let removed = store.remove(1).await.unwrap();
        assert_eq!(removed.local_id, target);
        assert_eq!(store.len(), 2);
        assert!(store.list().iter().all(|t| t.local_id != target));
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_out_of_range_leaves_store_unchanged() {
        let mut store = memory_store().await;
        store.add("a").await;
        let before = store.list().to_vec();

        let err = store.remove(1).await.unwrap_err();
        assert!(matches!(err, TaskError::IndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(store.list(), before.as_slice());
    }

    #[tokio::test]
    async fn test_update_renames_in_place() {
        let mut store = memory_store().await;
        store.add("a").await;
        store.add("b").await;
        let id = store.list()[1].local_id.clone();

        store.update(1, "b, but better\nwith notes").await.unwrap();
        assert_eq!(store.list()[1].local_id, id);
        assert_eq!(store.list()[1].title(), "b, but better");
        assert_eq!(store.list()[1].description(), "with notes");
    }

    #[tokio::test]
    async fn test_set_completed() {
        let mut store = memory_store().await;
        store.add("a").await;
        store.set_completed(0, true).await.unwrap();
        assert!(store.list()[0].is_completed);
    }

    #[tokio::test]
    async fn test_empty_store_rejects_every_index() {
        let mut store = memory_store().await;
        assert!(store.is_empty());
        assert!(store.update(0, "x").await.is_err());
        assert!(store.remove(0).await.is_err());
    }
}

// ─── Reload Tests ───────────────────────────────────────────────────────────

mod reload_tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_only_refreshes_on_reload() {
        let records = Arc::new(InMemoryRecordStore::new());
        let mut store = TaskStore::open(Arc::clone(&records)).await;

        records.create(NewTask::local("written behind")).await.unwrap();
        assert!(store.is_empty());

        store.reload().await;
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_exists_reflects_record_store() {
        let records = Arc::new(InMemoryRecordStore::new());
        let mut imported = NewTask::local("remote");
        imported.external_id = Some(5);
        records.create(imported).await.unwrap();

        let store = TaskStore::open(records).await;
        assert!(store.exists(5).await);
        assert!(!store.exists(6).await);
    }

    #[tokio::test]
    async fn test_subscriber_sees_final_state_of_each_operation() {
        let mut store = memory_store().await;
        let mut rx = store.subscribe();

        store.add("a").await;
        store.add("b").await;
        assert_eq!(rx.borrow_and_update().len(), 2);

        store.update(0, "a2").await.unwrap();
        assert_eq!(rx.borrow_and_update()[0].name.as_deref(), Some("a2"));
    }
}

// ─── Failure Absorption Tests ───────────────────────────────────────────────

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_fetch_yields_empty_cache() {
        let records = Arc::new(FlakyRecordStore::default());
        records.inner.create(NewTask::local("hidden")).await.unwrap();
        records.fail_reads.store(true, Ordering::SeqCst);

        let mut store = TaskStore::open(Arc::clone(&records)).await;
        assert!(store.is_empty());

        records.fail_reads.store(false, Ordering::SeqCst);
        store.reload().await;
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_create_is_absorbed() {
        let records = Arc::new(FlakyRecordStore::default());
        records.fail_writes.store(true, Ordering::SeqCst);

        let mut store = TaskStore::open(Arc::clone(&records)).await;
        store.add("lost").await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failed_persist_is_absorbed() {
        let records = Arc::new(FlakyRecordStore::default());
        records.fail_persist.store(true, Ordering::SeqCst);

        let mut store = TaskStore::open(Arc::clone(&records)).await;
        store.add("kept in memory").await;
        assert_eq!(store.len(), 1);
        store.persist().await;
    }

    #[tokio::test]
    async fn test_failed_update_still_returns_ok_and_reloads() {
        let records = Arc::new(FlakyRecordStore::default());
        let mut store = TaskStore::open(Arc::clone(&records)).await;
        store.add("original").await;

        records.fail_writes.store(true, Ordering::SeqCst);
        store.update(0, "changed").await.unwrap();
        assert_eq!(store.list()[0].name.as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn test_failed_existence_check_reports_false() {
        let records = Arc::new(FlakyRecordStore::default());
        let store = TaskStore::open(Arc::clone(&records)).await;
        records.fail_reads.store(true, Ordering::SeqCst);
        assert!(!store.exists(1).await);
    }
}

// ─── Durable Store Tests ────────────────────────────────────────────────────

mod file_store_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_task_store_mutations_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.json");

        {
            let records = Arc::new(JsonFileRecordStore::open(&path).await.unwrap());
            let mut store = TaskStore::open(records).await;
            store.add("first").await;
            store.add("second").await;
            store.toggle_completed(1).await.unwrap();
            store.remove(0).await.unwrap();
        }

        let records = Arc::new(JsonFileRecordStore::open(&path).await.unwrap());
        let store = TaskStore::open(records).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].name.as_deref(), Some("second"));
        assert!(store.list()[0].is_completed);
    }

    #[tokio::test]
    async fn test_store_from_settings_reopens_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StoreSettings {
            path: Some(dir.path().join("tasks.json")),
        };

        let mut store = TaskStore::from_settings(&settings).await.unwrap();
        assert!(store.records().is_durable());
        store.add("kept").await;
        drop(store);

        let store = TaskStore::from_settings(&settings).await.unwrap();
        assert_eq!(store.list()[0].name.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_store_from_settings_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, b"{ not a task list").unwrap();

        let err = TaskStore::from_settings(&StoreSettings { path: Some(path) })
            .await
            .unwrap_err();
        assert!(
            matches!(err, TaskError::Persistence(PersistenceError::Serialization(_))),
            "unexpected error: {err:?}"
        );
        assert_eq!(err.category(), "persistence");
    }
}
