//! Integration tests for SyncReconciler.
//!
//! Covers the import scenarios end to end through a TaskStore: first import,
//! repeated runs, the insert-only policy, failed fetches and the single
//! cache reload per run.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use todo_sync::domain::{NewTask, RemoteTaskRecord, Task, TaskChanges, TaskId};
use todo_sync::remote::{RemoteFetchError, StaticTaskSource};
use todo_sync::store::{InMemoryRecordStore, PersistenceError, RecordStore, TaskStore};
use todo_sync::sync::SyncReconciler;
use todo_sync::TaskError;

fn record(id: i64, text: &str, completed: bool) -> RemoteTaskRecord {
    RemoteTaskRecord {
        id,
        text: text.to_string(),
        completed,
        owner_id: 26,
    }
}

async fn empty_store() -> TaskStore<InMemoryRecordStore> {
    TaskStore::open(Arc::new(InMemoryRecordStore::new())).await
}

/// Record store wrapper that counts fetches and can fail lookups or inserts.
#[derive(Debug, Default)]
struct InstrumentedRecordStore {
    inner: InMemoryRecordStore,
    fetches: AtomicUsize,
    fail_lookups: AtomicBool,
    fail_creates: AtomicBool,
}

impl InstrumentedRecordStore {
    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn injected() -> PersistenceError {
        PersistenceError::Backend {
            message: "injected failure".to_string(),
        }
    }
}

#[async_trait]
impl RecordStore for InstrumentedRecordStore {
    async fn create(&self, new: NewTask) -> Result<Task, PersistenceError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.create(new).await
    }

    async fn fetch_all(&self) -> Result<Vec<Task>, PersistenceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_all().await
    }

    async fn count_by_external_id(&self, external_id: i64) -> Result<usize, PersistenceError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.count_by_external_id(external_id).await
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, PersistenceError> {
        self.inner.delete(id).await
    }

    async fn update(&self, id: &TaskId, changes: TaskChanges) -> Result<(), PersistenceError> {
        self.inner.update(id, changes).await
    }

    async fn persist_pending_changes(&self) -> Result<(), PersistenceError> {
        self.inner.persist_pending_changes().await
    }
}

async fn instrumented_store() -> (
    Arc<InstrumentedRecordStore>,
    TaskStore<InstrumentedRecordStore>,
) {
    let records = Arc::new(InstrumentedRecordStore::default());
    let store = TaskStore::open(Arc::clone(&records)).await;
    (records, store)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_import_maps_records_in_order() {
    let source = Arc::new(StaticTaskSource::new(vec![
        record(1, "A", false),
        record(2, "B", true),
    ]));
    let mut store = empty_store().await;

    let report = SyncReconciler::new(source).run(&mut store).await.unwrap();
    assert_eq!(report.inserted, 2);

    let tasks = store.list();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].external_id, Some(1));
    assert_eq!(tasks[0].name.as_deref(), Some("A"));
    assert!(!tasks[0].is_completed);
    assert_eq!(tasks[1].external_id, Some(2));
    assert_eq!(tasks[1].name.as_deref(), Some("B"));
    assert!(tasks[1].is_completed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_run_adds_nothing() {
    let source = Arc::new(StaticTaskSource::new(
        (1..=5).map(|id| record(id, "t", false)).collect(),
    ));
    let mut store = empty_store().await;
    let reconciler = SyncReconciler::new(Arc::clone(&source));

    reconciler.run(&mut store).await.unwrap();
    let after_first: Vec<_> = store.list().to_vec();
    assert_eq!(after_first.len(), 5);

    let report = reconciler.run(&mut store).await.unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped_existing, 5);
    assert_eq!(store.list(), after_first.as_slice());
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_existing_external_id_is_not_overwritten() {
    let records = Arc::new(InMemoryRecordStore::new());
    let mut existing = NewTask::local("Local wording");
    existing.external_id = Some(5);
    records.create(existing).await.unwrap();
    let mut store = TaskStore::open(records).await;

    let source = Arc::new(StaticTaskSource::new(vec![record(5, "Remote wording", true)]));
    SyncReconciler::new(source).run(&mut store).await.unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.list()[0].external_id, Some(5));
    assert_eq!(store.list()[0].name.as_deref(), Some("Local wording"));
    assert!(!store.list()[0].is_completed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_local_tasks_survive_import() {
    let mut store = empty_store().await;
    store.add("Mine").await;

    let source = Arc::new(StaticTaskSource::new(vec![record(1, "Theirs", false)]));
    SyncReconciler::new(source).run(&mut store).await.unwrap();

    let names: Vec<_> = store.list().iter().map(|t| t.title().to_string()).collect();
    assert_eq!(names, ["Mine", "Theirs"]);
    assert_eq!(store.list()[0].external_id, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_fetch_leaves_store_untouched() {
    let mut store = empty_store().await;
    store.add("keep me").await;
    let before = store.list().to_vec();
    let rx = store.subscribe();

    let source = Arc::new(StaticTaskSource::failing(RemoteFetchError::Status {
        status: 503,
    }));
    let err = SyncReconciler::new(source)
        .run(&mut store)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TaskError::RemoteFetch(RemoteFetchError::Status { status: 503 })
    ));
    assert_eq!(store.list(), before.as_slice());
    assert!(!rx.has_changed().unwrap());
    assert_eq!(store.records().persist_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_publishes_full_import() {
    let mut store = empty_store().await;
    let mut rx = store.subscribe();
    let source = Arc::new(StaticTaskSource::new(
        (1..=10).map(|id| record(id, "bulk", false)).collect(),
    ));

    SyncReconciler::new(source).run(&mut store).await.unwrap();

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 10);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_recovers_after_failed_run() {
    let source = Arc::new(StaticTaskSource::failing(RemoteFetchError::Timeout));
    let mut store = empty_store().await;
    let reconciler = SyncReconciler::new(Arc::clone(&source));

    assert!(reconciler.run(&mut store).await.is_err());
    assert!(!reconciler.has_synced());

    source.set_response(Ok(vec![record(1, "late", false)]));
    reconciler.run(&mut store).await.unwrap();
    assert!(reconciler.has_synced());
    assert_eq!(store.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_reloads_cache_once() {
    let (records, mut store) = instrumented_store().await;
    let source = Arc::new(StaticTaskSource::new(
        (1..=7).map(|id| record(id, "bulk", false)).collect(),
    ));
    let reconciler = SyncReconciler::new(source);

    let before = records.fetch_count();
    let report = reconciler.run(&mut store).await.unwrap();
    assert_eq!(records.fetch_count(), before + 1);
    assert_eq!((report.inserted, report.failed), (7, 0));

    let before = records.fetch_count();
    reconciler.run(&mut store).await.unwrap();
    assert_eq!(records.fetch_count(), before + 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_existence_checks_skip_records() {
    let (records, mut store) = instrumented_store().await;
    store.add("local").await;
    let before = store.list().to_vec();
    records.fail_lookups.store(true, Ordering::SeqCst);

    let source = Arc::new(StaticTaskSource::new(
        (1..=3).map(|id| record(id, "remote", false)).collect(),
    ));
    let report = SyncReconciler::new(source).run(&mut store).await.unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.failed, 3);
    assert!(report.is_noop());
    assert_eq!(store.list(), before.as_slice());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_inserts_are_counted() {
    let (records, mut store) = instrumented_store().await;
    let source = Arc::new(StaticTaskSource::new(vec![
        record(1, "first", false),
        record(2, "second", true),
    ]));
    let reconciler = SyncReconciler::new(Arc::clone(&source));
    reconciler.run(&mut store).await.unwrap();
    let before = store.list().to_vec();

    records.fail_creates.store(true, Ordering::SeqCst);
    source.set_response(Ok(vec![
        record(1, "first", false),
        record(3, "third", false),
        record(4, "fourth", true),
    ]));
    let report = reconciler.run(&mut store).await.unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped_existing, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(store.list(), before.as_slice());
}
