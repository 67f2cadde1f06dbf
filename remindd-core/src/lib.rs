//! `remindd` core library.
//!
//! Building blocks for the task-reminder backend: the task domain model,
//! the task store port with a bundled in-memory engine, the owner-scoped
//! task service, the reminder notifier, and the periodic reminder
//! scheduler. The HTTP surface lives in the `remindd-server` crate.

pub mod clock;
pub mod error;
pub mod notify;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod task;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::TaskError;
pub use notify::{
    Contact, ContactDirectory, MailTransport, MemoryDirectory, Notifier, NotifyError,
    ReminderEmail,
};
pub use scheduler::{ReminderScheduler, SchedulerHandle};
pub use service::{ListOptions, SortBy, StatusFilter, TaskService, TaskStats};
pub use store::{MemoryStore, StoreError, TaskFilter, TaskQuery, TaskSort, TaskStore};
pub use task::{
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, NewTask, Priority, Task, TaskId, TaskPatch,
};
