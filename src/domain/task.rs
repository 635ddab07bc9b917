//! Task entity -- the persisted shape of a to-do item.
//!
//! [`Task`] is what the durable record store hands back. Its [`TaskId`] is
//! assigned by the store on creation and never changes afterwards. Tasks
//! imported from the remote feed additionally carry an `external_id`, which
//! is the deduplication key used by the sync reconciler.
//!
//! [`NewTask`] and [`TaskChanges`] are the write-side shapes passed to
//! [`RecordStore::create`](crate::store::backend::RecordStore::create) and
//! [`RecordStore::update`](crate::store::backend::RecordStore::update).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::remote::RemoteTaskRecord;

/// Opaque, stable identifier assigned by the durable store.
///
/// # Examples
///
/// ```
/// use todo_sync::domain::TaskId;
///
/// let a = TaskId::generate();
/// let b = TaskId::generate();
/// assert_ne!(a, b);
/// assert_eq!(a.as_str().len(), 36);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh `UUIDv4` identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A persisted to-do item.
///
/// `name` is free-form text. By presentation convention the first line is
/// the title and the remaining lines the description (see [`Task::title`]
/// and [`Task::description`]); the store itself treats it as opaque. A
/// `None` name never matches a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier, immutable after creation.
    pub local_id: TaskId,

    /// Identifier from the remote feed. `None` for locally created tasks.
    #[serde(default)]
    pub external_id: Option<i64>,

    /// Task text.
    #[serde(default)]
    pub name: Option<String>,

    /// Completion flag.
    #[serde(default)]
    pub is_completed: bool,

    /// When the task was created.
    pub creation_date: DateTime<Utc>,
}

impl Task {
    /// Builds a task from its write-side shape and a freshly assigned id.
    ///
    /// Only durable stores call this; everyone else receives tasks from a
    /// store.
    pub fn from_new(local_id: TaskId, new: NewTask) -> Self {
        Self {
            local_id,
            external_id: new.external_id,
            name: Some(new.name),
            is_completed: new.is_completed,
            creation_date: new.creation_date,
        }
    }

    /// Applies a set of field changes in place.
    pub fn apply(&mut self, changes: &TaskChanges) {
        if let Some(name) = &changes.name {
            self.name = Some(name.clone());
        }
        if let Some(done) = changes.is_completed {
            self.is_completed = done;
        }
        if let Some(date) = changes.creation_date {
            self.creation_date = date;
        }
    }

    /// First line of the name, or `""` when the name is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use todo_sync::domain::{NewTask, Task, TaskId};
    ///
    /// let task = Task::from_new(TaskId::generate(), NewTask::local("Groceries\nmilk, eggs\nbread"));
    /// assert_eq!(task.title(), "Groceries");
    /// assert_eq!(task.description(), "milk, eggs\nbread");
    /// ```
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .and_then(|name| name.split('\n').next())
            .unwrap_or_default()
    }

    /// Everything after the first line, or `""` for single-line names.
    pub fn description(&self) -> &str {
        self.name
            .as_deref()
            .and_then(|name| name.split_once('\n'))
            .map_or("", |(_, rest)| rest)
    }

    /// Creation date rendered as `dd.MM.yyyy`.
    pub fn formatted_date(&self) -> String {
        self.creation_date.format("%d.%m.%Y").to_string()
    }
}

/// Write-side shape of a task that does not exist yet.
///
/// Local tasks are built with [`NewTask::local`]; imported tasks come from
/// [`NewTask::from_remote`], which is the only constructor that sets
/// `external_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Task text.
    pub name: String,
    /// Completion flag, `false` unless set.
    pub is_completed: bool,
    /// Creation timestamp, "now" unless set.
    pub creation_date: DateTime<Utc>,
    /// Remote identifier for imported tasks.
    pub external_id: Option<i64>,
}

impl NewTask {
    /// A locally authored task: not completed, created now, no external id.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_completed: false,
            creation_date: Utc::now(),
            external_id: None,
        }
    }

    /// Maps a remote record 1:1 into a new task stamped with the current time.
    pub fn from_remote(record: &RemoteTaskRecord) -> Self {
        Self {
            name: record.text.clone(),
            is_completed: record.completed,
            creation_date: Utc::now(),
            external_id: Some(record.id),
        }
    }

    /// Sets the completion flag.
    pub fn with_completed(mut self, is_completed: bool) -> Self {
        self.is_completed = is_completed;
        self
    }

    /// Sets the creation timestamp.
    pub fn with_creation_date(mut self, creation_date: DateTime<Utc>) -> Self {
        self.creation_date = creation_date;
        self
    }
}

/// Partial update of an existing task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement completion flag.
    pub is_completed: Option<bool>,
    /// Replacement creation timestamp.
    pub creation_date: Option<DateTime<Utc>>,
}

impl TaskChanges {
    /// Changes only the name.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Changes only the completion flag.
    pub fn completed(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
            ..Self::default()
        }
    }

    /// Also replaces the creation timestamp.
    pub fn with_creation_date(mut self, creation_date: DateTime<Utc>) -> Self {
        self.creation_date = Some(creation_date);
        self
    }

    /// Returns `true` when no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_completed.is_none() && self.creation_date.is_none()
    }
}
