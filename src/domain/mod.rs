//! Domain types: the persisted [`Task`] and the transient remote feed records.

pub mod remote;
pub mod task;

pub use remote::{RemoteTaskPage, RemoteTaskRecord};
pub use task::{NewTask, Task, TaskChanges, TaskId};
