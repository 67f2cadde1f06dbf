//! Task store port and the bundled in-memory engine.
//!
//! [`TaskStore`] is the narrow seam between the task service/scheduler and
//! whatever document store backs the system: a conjunctive filter, a small
//! set of sort orders, and atomic single-record writes. [`MemoryStore`] is
//! the in-process implementation used by the server and by tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::task::{Priority, Task, TaskId};

/// Errors that can occur in a task store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Write rejected: the record's reminder time is not before its due
    /// date. The store enforces this invariant on every insert and update,
    /// independently of the service-level validation.
    #[error("Reminder time must be before due date")]
    ReminderAfterDue,
    /// The backing store could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Conjunctive filter over task records. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Match tasks owned by this principal.
    pub owner_id: Option<String>,
    /// Match tasks with this completion state.
    pub completed: Option<bool>,
    /// Match tasks with exactly this priority.
    pub priority: Option<Priority>,
    /// Match tasks due strictly before this instant.
    pub due_before: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// Filter matching every task owned by the given principal.
    #[must_use]
    pub fn owner(owner_id: &str) -> Self {
        Self {
            owner_id: Some(owner_id.to_string()),
            ..Self::default()
        }
    }

    /// Whether the given task satisfies every set field of this filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(owner_id) = &self.owner_id {
            if task.owner_id != *owner_id {
                return false;
            }
        }
        if let Some(completed) = self.completed {
            if task.is_completed != completed {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(due_before) = self.due_before {
            if task.due_date >= due_before {
                return false;
            }
        }
        true
    }
}

/// Sort orders a task store must support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSort {
    /// Ascending due date.
    DueDateAsc,
    /// Priority wire string descending, then ascending due date.
    ///
    /// The comparison is lexicographic on the raw value, so the resulting
    /// order is `medium`, `low`, `high` -- not the semantic rank order.
    PriorityThenDueDate,
    /// Descending creation time (newest first). The default listing order.
    #[default]
    CreatedDesc,
}

impl TaskSort {
    /// Total order used by [`TaskStore::find_many`]. Ties break on task id
    /// so results are deterministic.
    #[must_use]
    pub fn cmp(self, a: &Task, b: &Task) -> Ordering {
        let primary = match self {
            Self::DueDateAsc => a.due_date.cmp(&b.due_date),
            Self::PriorityThenDueDate => b
                .priority
                .as_str()
                .cmp(a.priority.as_str())
                .then_with(|| a.due_date.cmp(&b.due_date)),
            Self::CreatedDesc => b.created_at.cmp(&a.created_at),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// A filter plus a sort order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Which tasks to return.
    pub filter: TaskFilter,
    /// In what order.
    pub sort: TaskSort,
}

/// Persistent collection of task records.
///
/// Guarantees atomic single-record writes; no multi-record transactions.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a new task, stamping `created_at` and `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReminderAfterDue`] if the record violates the
    /// reminder/due invariant, or [`StoreError::Unavailable`] on failure.
    async fn insert(&self, task: Task) -> Result<Task, StoreError>;

    /// Looks up a task by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on failure.
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Returns all tasks matching the query's filter, in its sort order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on failure.
    async fn find_many(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError>;

    /// Counts tasks matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on failure.
    async fn count(&self, filter: &TaskFilter) -> Result<u64, StoreError>;

    /// Replaces the stored record with the same id, re-stamping
    /// `updated_at`. Atomic per record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReminderAfterDue`] if the record violates the
    /// reminder/due invariant, or [`StoreError::Unavailable`] if no record
    /// with this id exists or the write fails.
    async fn update(&self, task: Task) -> Result<Task, StoreError>;

    /// Removes a task permanently. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on failure.
    async fn delete(&self, id: TaskId) -> Result<bool, StoreError>;

    /// Tasks whose reminder window has opened: not yet notified, not
    /// completed, and `reminder_at` within `[from, to]` inclusive.
    /// Ordered by ascending reminder time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] on failure.
    async fn due_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError>;
}

/// In-memory task store over a `HashMap`.
///
/// Thread-safe via [`RwLock`]. Record timestamps are stamped from the
/// injected clock on every write.
pub struct MemoryStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Creates a new, empty store stamping timestamps from the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, mut task: Task) -> Result<Task, StoreError> {
        if task.reminder_at >= task.due_date {
            return Err(StoreError::ReminderAfterDue);
        }
        let now = self.clock.now();
        task.created_at = now;
        task.updated_at = now;
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).cloned())
    }

    async fn find_many(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut matched: Vec<Task> = tasks
            .values()
            .filter(|t| query.filter.matches(t))
            .cloned()
            .collect();
        drop(tasks);
        matched.sort_by(|a, b| query.sort.cmp(a, b));
        Ok(matched)
    }

    async fn count(&self, filter: &TaskFilter) -> Result<u64, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().filter(|t| filter.matches(t)).count() as u64)
    }

    async fn update(&self, mut task: Task) -> Result<Task, StoreError> {
        if task.reminder_at >= task.due_date {
            return Err(StoreError::ReminderAfterDue);
        }
        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(&task.id) {
            return Err(StoreError::Unavailable(format!(
                "update of missing task {}",
                task.id
            )));
        }
        task.updated_at = self.clock.now();
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.remove(&id).is_some())
    }

    async fn due_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut due: Vec<Task> = tasks
            .values()
            .filter(|t| {
                !t.is_notified && !t.is_completed && t.reminder_at >= from && t.reminder_at <= to
            })
            .cloned()
            .collect();
        drop(tasks);
        due.sort_by(|a, b| {
            a.reminder_at
                .cmp(&b.reminder_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(due)
    }
}
