//! Local to-do task store with one-way sync from a remote task feed.
//!
//! The crate is the core of a single-user to-do application: it keeps the
//! task list, imports externally authored tasks without duplicating them,
//! and derives a searchable view for a presentation layer to render.
//!
//! # Overview
//!
//! - [`TaskStore`] caches every task from a durable [`RecordStore`] and
//!   reloads the cache after each mutation.
//! - [`SyncReconciler`] pulls a [`RemoteTaskSource`] and inserts records
//!   whose remote id is not stored yet. It never overwrites.
//! - [`TaskListView`] filters the list by a live search text and pushes
//!   snapshots to observers.
//!
//! # Module Organization
//!
//! - [`domain`] - Task entity and remote feed records
//! - [`store`] - Record store trait, bundled engines and the task store
//! - [`remote`] - Remote task source trait and implementations
//! - [`sync`] - The reconciler
//! - [`filter`] - Search/filter pipeline
//! - [`config`] - TOML configuration
//! - [`error`] - Error types

pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
#[cfg(feature = "logging")]
pub mod logging;
pub mod remote;
pub mod store;
pub mod sync;

// Re-exports for ergonomic access
pub use config::TodoConfig;
pub use domain::{NewTask, RemoteTaskRecord, Task, TaskChanges, TaskId};
pub use error::TaskError;
pub use filter::{filtered, FilteredTasks, TaskListView};
pub use remote::{RemoteFetchError, RemoteTaskSource, StaticTaskSource};
pub use store::{
    ConfiguredRecordStore, InMemoryRecordStore, JsonFileRecordStore, PersistenceError, RecordStore,
    TaskStore,
};
pub use sync::{SyncReconciler, SyncReport};

#[cfg(feature = "http-client")]
pub use remote::HttpTaskSource;
