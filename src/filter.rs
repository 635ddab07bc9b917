//! Search/filter pipeline over the task list.
//!
//! [`filtered`] is the pure computation: an empty search text returns the
//! list unchanged, anything else keeps the tasks whose name contains the
//! text case-insensitively, in their original order.
//!
//! [`TaskListView`] makes it reactive. It holds the latest task list and
//! search text, recomputes synchronously whenever either changes, and
//! publishes a [`FilteredTasks`] snapshot on a `watch` channel. Because the
//! recompute happens inside the call that applied the change, a subscriber
//! never observes a snapshot older than that change.
//!
//! [`TaskListView::follow`] wires the view to a
//! [`TaskStore`](crate::store::TaskStore) subscription and a search-text
//! channel and keeps it in step with both.

use tokio::sync::watch;

use crate::domain::Task;

/// Returns the tasks whose name contains `search_text`, ignoring case.
///
/// Empty `search_text` (exactly `""`, no trimming) returns `tasks` as-is.
/// Tasks without a name never match a non-empty search.
///
/// # Examples
///
/// ```
/// use todo_sync::domain::{NewTask, Task, TaskId};
/// use todo_sync::filter::filtered;
///
/// let tasks = vec![
///     Task::from_new(TaskId::generate(), NewTask::local("Buy milk")),
///     Task::from_new(TaskId::generate(), NewTask::local("Clean")),
/// ];
/// let hits = filtered(&tasks, "buy");
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].name.as_deref(), Some("Buy milk"));
/// assert_eq!(filtered(&tasks, ""), tasks);
/// ```
pub fn filtered(tasks: &[Task], search_text: &str) -> Vec<Task> {
    if search_text.is_empty() {
        return tasks.to_vec();
    }
    let needle = search_text.to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            task.name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Label shown next to the list, derived from the total task count.
///
/// ```
/// use todo_sync::filter::count_label;
///
/// assert_eq!(count_label(0), "0 tasks");
/// assert_eq!(count_label(1), "1 task");
/// assert_eq!(count_label(7), "7 tasks");
/// ```
pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 task".to_string()
    } else {
        format!("{count} tasks")
    }
}

/// Snapshot published to observers of a [`TaskListView`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredTasks {
    /// Tasks matching the current search text, in list order.
    pub tasks: Vec<Task>,
    /// The search text the snapshot was computed with.
    pub search_text: String,
    /// Number of tasks before filtering.
    pub total: usize,
    /// [`count_label`] of `total`.
    pub count_label: String,
}

/// Reactive filtered view over a task list.
///
/// # Examples
///
/// ```
/// use todo_sync::domain::{NewTask, Task, TaskId};
/// use todo_sync::filter::TaskListView;
///
/// let mut view = TaskListView::new(vec![
///     Task::from_new(TaskId::generate(), NewTask::local("Buy milk")),
///     Task::from_new(TaskId::generate(), NewTask::local("Clean")),
/// ]);
/// let rx = view.subscribe();
///
/// view.set_search_text("CLEAN");
/// assert_eq!(rx.borrow().tasks.len(), 1);
/// assert_eq!(rx.borrow().count_label, "2 tasks");
/// ```
#[derive(Debug)]
pub struct TaskListView {
    tasks: Vec<Task>,
    search_text: String,
    output: watch::Sender<FilteredTasks>,
}

impl TaskListView {
    /// Creates a view over `tasks` with an empty search text.
    pub fn new(tasks: Vec<Task>) -> Self {
        let snapshot = Self::compute(&tasks, "");
        let (output, _) = watch::channel(snapshot);
        Self {
            tasks,
            search_text: String::new(),
            output,
        }
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<FilteredTasks> {
        self.output.subscribe()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> FilteredTasks {
        self.output.borrow().clone()
    }

    /// Current search text.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Replaces the task list and republishes.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.publish();
    }

    /// Replaces the search text and republishes.
    pub fn set_search_text(&mut self, search_text: impl Into<String>) {
        self.search_text = search_text.into();
        self.publish();
    }

    /// Keeps the view in step with a task list channel and a search-text channel.
    ///
    /// Applies the current values of both receivers first, then every
    /// subsequent change, until both senders are dropped. Run it on its
    /// own task and observe through [`subscribe`](Self::subscribe), taken
    /// before the view is moved in.
    pub async fn follow(
        mut self,
        mut tasks_rx: watch::Receiver<Vec<Task>>,
        mut search_rx: watch::Receiver<String>,
    ) {
        self.tasks = tasks_rx.borrow_and_update().clone();
        self.search_text = search_rx.borrow_and_update().clone();
        self.publish();

        let mut tasks_open = true;
        let mut search_open = true;
        while tasks_open || search_open {
            tokio::select! {
                changed = tasks_rx.changed(), if tasks_open => match changed {
                    Ok(()) => {
                        let tasks = tasks_rx.borrow_and_update().clone();
                        self.set_tasks(tasks);
                    },
                    Err(_) => tasks_open = false,
                },
                changed = search_rx.changed(), if search_open => match changed {
                    Ok(()) => {
                        let text = search_rx.borrow_and_update().clone();
                        self.set_search_text(text);
                    },
                    Err(_) => search_open = false,
                },
            }
        }
        tracing::debug!("task list view inputs closed");
    }

    fn compute(tasks: &[Task], search_text: &str) -> FilteredTasks {
        FilteredTasks {
            tasks: filtered(tasks, search_text),
            search_text: search_text.to_string(),
            total: tasks.len(),
            count_label: count_label(tasks.len()),
        }
    }

    fn publish(&self) {
        let next = Self::compute(&self.tasks, &self.search_text);
        self.output.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
