//! One-way, insert-only import of remote tasks.
//!
//! [`SyncReconciler::run`] fetches the remote feed and inserts every record
//! whose `id` is not yet stored as an `external_id`. Records that already
//! exist are left alone even if their text or completion flag changed
//! upstream: the merge never overwrites.
//!
//! # Sequencing
//!
//! The fetch and the per-record check-then-insert loop run on a spawned
//! tokio task, off the caller's sequence. `run` awaits the whole loop, then
//! reloads the [`TaskStore`] cache exactly once on the caller's sequence
//! before returning. Observers therefore see either the pre-sync list or
//! the fully imported one, never a partial import.
//!
//! # Concurrency
//!
//! The check-then-insert loop is not transactional. Two runs racing on the
//! same record store can import the same remote id twice. Callers run sync
//! serially (for example once at startup); `run` borrowing the store
//! mutably enforces that for a single `TaskStore`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

#[cfg(feature = "http-client")]
use crate::config::SyncSettings;
use crate::domain::NewTask;
use crate::error::TaskError;
#[cfg(feature = "http-client")]
use crate::remote::HttpTaskSource;
use crate::remote::{RemoteFetchError, RemoteTaskSource};
use crate::store::backend::{external_id_exists, RecordStore};
use crate::store::TaskStore;

/// Outcome of one successful reconciler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Records received from the feed.
    pub fetched: usize,
    /// Records inserted as new tasks.
    pub inserted: usize,
    /// Records skipped because their id was already stored.
    pub skipped_existing: usize,
    /// Records skipped because the record store failed on them.
    pub failed: usize,
    /// When the import loop finished.
    pub completed_at: DateTime<Utc>,
}

impl SyncReport {
    fn new(fetched: usize) -> Self {
        Self {
            fetched,
            inserted: 0,
            skipped_existing: 0,
            failed: 0,
            completed_at: Utc::now(),
        }
    }

    /// Returns `true` if the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.inserted == 0
    }
}

/// Imports remote tasks into a [`TaskStore`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use todo_sync::domain::RemoteTaskRecord;
/// use todo_sync::remote::StaticTaskSource;
/// use todo_sync::store::{InMemoryRecordStore, TaskStore};
/// use todo_sync::sync::SyncReconciler;
///
/// # tokio::runtime::Builder::new_multi_thread().build().unwrap().block_on(async {
/// let source = Arc::new(StaticTaskSource::new(vec![RemoteTaskRecord {
///     id: 1,
///     text: "A".to_string(),
///     completed: false,
///     owner_id: 0,
/// }]));
/// let mut store = TaskStore::open(Arc::new(InMemoryRecordStore::new())).await;
/// let reconciler = SyncReconciler::new(source);
///
/// reconciler.run(&mut store).await.unwrap();
/// reconciler.run(&mut store).await.unwrap();
/// assert_eq!(store.len(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct SyncReconciler<R: RemoteTaskSource> {
    source: Arc<R>,
    last_report: Mutex<Option<SyncReport>>,
}

impl<R: RemoteTaskSource + 'static> SyncReconciler<R> {
    /// Creates a reconciler pulling from `source`.
    pub fn new(source: Arc<R>) -> Self {
        Self {
            source,
            last_report: Mutex::new(None),
        }
    }

    /// Report of the last successful run, if any.
    ///
    /// Failed runs leave this untouched.
    pub fn last_report(&self) -> Option<SyncReport> {
        self.last_report.lock().clone()
    }

    /// Returns `true` once a run has completed successfully.
    pub fn has_synced(&self) -> bool {
        self.last_report.lock().is_some()
    }

    /// Fetches the feed and inserts unseen records into `store`.
    ///
    /// # Errors
    ///
    /// - [`TaskError::RemoteFetch`] if the feed fails. The store and its
    ///   cache are not touched.
    /// - [`TaskError::SyncInterrupted`] if the background import task
    ///   panicked. Records inserted before the panic stay in the record
    ///   store but the cache is not reloaded.
    pub async fn run<S: RecordStore + 'static>(
        &self,
        store: &mut TaskStore<S>,
    ) -> Result<SyncReport, TaskError> {
        let source = Arc::clone(&self.source);
        let records = store.records();

        let handle =
            tokio::spawn(async move { import(source.as_ref(), records.as_ref()).await });
        let report = match handle.await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, category = e.category(), "failed to sync tasks");
                return Err(e.into());
            },
            Err(e) => {
                tracing::error!(error = %e, "task import aborted");
                return Err(TaskError::SyncInterrupted {
                    message: e.to_string(),
                });
            },
        };

        store.reload().await;
        tracing::info!(
            fetched = report.fetched,
            inserted = report.inserted,
            skipped = report.skipped_existing,
            failed = report.failed,
            "task sync complete"
        );
        *self.last_report.lock() = Some(report.clone());
        Ok(report)
    }
}

#[cfg(feature = "http-client")]
impl SyncReconciler<HttpTaskSource> {
    /// Builds a reconciler over the HTTP feed described by `[sync]`.
    ///
    /// Returns `Ok(None)` when sync is disabled.
    ///
    /// # Errors
    ///
    /// Propagates [`HttpTaskSource::from_settings`] failures.
    pub fn from_settings(settings: &SyncSettings) -> Result<Option<Self>, RemoteFetchError> {
        if !settings.enabled {
            tracing::debug!("task sync disabled by config");
            return Ok(None);
        }
        let source = HttpTaskSource::from_settings(settings)?;
        Ok(Some(Self::new(Arc::new(source))))
    }

    /// The feed this reconciler pulls from.
    pub fn endpoint(&self) -> &url::Url {
        self.source.endpoint()
    }
}

/// The off-sequence part of a run: fetch, then check-then-insert per record.
async fn import<R, S>(source: &R, records: &S) -> Result<SyncReport, RemoteFetchError>
where
    R: RemoteTaskSource + ?Sized,
    S: RecordStore + ?Sized,
{
    let remote = source.fetch_all().await?;
    let mut report = SyncReport::new(remote.len());

    for record in &remote {
        match external_id_exists(records, record.id).await {
            Ok(true) => {
                report.skipped_existing += 1;
                continue;
            },
            Ok(false) => {},
            Err(e) => {
                // Unknown existence: skipping keeps the import idempotent.
                tracing::error!(external_id = record.id, error = %e, "existence check failed");
                report.failed += 1;
                continue;
            },
        }

        match records.create(NewTask::from_remote(record)).await {
            Ok(task) => {
                tracing::debug!(external_id = record.id, task_id = %task.local_id, "imported task");
                report.inserted += 1;
            },
            Err(e) => {
                tracing::error!(external_id = record.id, error = %e, "failed to import task");
                report.failed += 1;
            },
        }
    }

    if report.inserted > 0 {
        if let Err(e) = records.persist_pending_changes().await {
            tracing::error!(error = %e, "failed to persist imported tasks");
        }
    }

    report.completed_at = Utc::now();
    Ok(report)
}
