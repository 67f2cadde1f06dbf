//! Owner-scoped task operations: CRUD, completion, and aggregate stats.
//!
//! Every operation takes the id of the authenticated owner and verifies it
//! against the task's owner reference. Existence is checked before
//! ownership, so a request for a missing task reports not-found even when
//! the caller would not have been authorized anyway.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::Clock;
use crate::error::TaskError;
use crate::store::{TaskFilter, TaskQuery, TaskSort, TaskStore};
use crate::task::{
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, NewTask, Priority, Task, TaskId, TaskPatch,
};

/// Completion-state filter for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Only completed tasks.
    Completed,
    /// Only pending (not completed) tasks.
    Pending,
}

/// Requested listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Ascending due date.
    DueDate,
    /// Priority then due date (see [`TaskSort::PriorityThenDueDate`]).
    Priority,
}

/// Options for listing an owner's tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Completion-state filter; `None` lists both.
    pub status: Option<StatusFilter>,
    /// Exact priority filter; `None` lists all priorities.
    pub priority: Option<Priority>,
    /// Sort order; `None` lists newest-created first.
    pub sort_by: Option<SortBy>,
}

/// Aggregate task counts for one owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// All tasks owned by the principal.
    pub total: u64,
    /// Tasks marked completed.
    pub completed: u64,
    /// Tasks not yet completed.
    pub pending: u64,
    /// Pending tasks whose due date has passed.
    pub overdue: u64,
}

/// Validates and mutates tasks on behalf of an authenticated owner.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    /// Creates a service over the given store and clock.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Lists the owner's tasks, filtered and sorted per `opts`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Store`] if the store fails.
    pub async fn list(&self, owner_id: &str, opts: ListOptions) -> Result<Vec<Task>, TaskError> {
        let filter = TaskFilter {
            owner_id: Some(owner_id.to_string()),
            completed: opts.status.map(|s| s == StatusFilter::Completed),
            priority: opts.priority,
            due_before: None,
        };
        let sort = match opts.sort_by {
            Some(SortBy::DueDate) => TaskSort::DueDateAsc,
            Some(SortBy::Priority) => TaskSort::PriorityThenDueDate,
            None => TaskSort::CreatedDesc,
        };
        Ok(self.store.find_many(&TaskQuery { filter, sort }).await?)
    }

    /// Fetches a single task owned by the principal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] if no task has this id,
    /// [`TaskError::Forbidden`] if it belongs to someone else, or
    /// [`TaskError::Store`] if the store fails.
    pub async fn get(&self, owner_id: &str, id: TaskId) -> Result<Task, TaskError> {
        let task = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(TaskError::NotFound(id))?;
        if task.owner_id != owner_id {
            return Err(TaskError::Forbidden);
        }
        Ok(task)
    }

    /// Creates a task for the owner after validating title, description,
    /// and date ordering.
    ///
    /// # Errors
    ///
    /// Returns a validation variant of [`TaskError`] for bad input, or
    /// [`TaskError::Store`] if the store fails.
    pub async fn create(&self, owner_id: &str, new: NewTask) -> Result<Task, TaskError> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskError::MissingFields);
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(TaskError::TitleTooLong);
        }
        let description = match new.description {
            Some(d) => {
                let d = d.trim().to_string();
                if d.chars().count() > MAX_DESCRIPTION_LENGTH {
                    return Err(TaskError::DescriptionTooLong);
                }
                if d.is_empty() { None } else { Some(d) }
            }
            None => None,
        };

        let now = self.clock.now();
        if new.due_date <= now {
            return Err(TaskError::DueDateNotFuture);
        }
        if new.reminder_at >= new.due_date {
            return Err(TaskError::ReminderAfterDue);
        }
        if new.reminder_at <= now {
            return Err(TaskError::ReminderNotFuture);
        }

        let task = Task {
            id: TaskId::new(),
            owner_id: owner_id.to_string(),
            title,
            description,
            due_date: new.due_date,
            reminder_at: new.reminder_at,
            priority: new.priority.unwrap_or_default(),
            is_completed: false,
            completed_at: None,
            is_notified: false,
            // Placeholders; the store stamps both on insert.
            created_at: now,
            updated_at: now,
        };
        Ok(self.store.insert(task).await?)
    }

    /// Applies a partial update to a task owned by the principal.
    ///
    /// If either date is supplied, the effective (supplied-or-existing)
    /// pair must still satisfy `reminder_at < due_date`. An empty-string
    /// title keeps the existing title; an empty-string description clears
    /// the description.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] / [`TaskError::Forbidden`] as in
    /// [`Self::get`], a validation variant for bad input, or
    /// [`TaskError::Store`] if the store fails.
    pub async fn update(
        &self,
        owner_id: &str,
        id: TaskId,
        patch: TaskPatch,
    ) -> Result<Task, TaskError> {
        let mut task = self.get(owner_id, id).await?;

        if patch.due_date.is_some() || patch.reminder_at.is_some() {
            let due = patch.due_date.unwrap_or(task.due_date);
            let reminder = patch.reminder_at.unwrap_or(task.reminder_at);
            if reminder >= due {
                return Err(TaskError::ReminderAfterDue);
            }
        }

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if !title.is_empty() {
                if title.chars().count() > MAX_TITLE_LENGTH {
                    return Err(TaskError::TitleTooLong);
                }
                task.title = title;
            }
        }
        if let Some(description) = patch.description {
            let description = description.trim().to_string();
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(TaskError::DescriptionTooLong);
            }
            task.description = if description.is_empty() {
                None
            } else {
                Some(description)
            };
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(reminder_at) = patch.reminder_at {
            task.reminder_at = reminder_at;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }

        Ok(self.store.update(task).await?)
    }

    /// Permanently deletes a task owned by the principal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] / [`TaskError::Forbidden`] as in
    /// [`Self::get`], or [`TaskError::Store`] if the store fails.
    pub async fn delete(&self, owner_id: &str, id: TaskId) -> Result<(), TaskError> {
        let task = self.get(owner_id, id).await?;
        self.store.delete(task.id).await?;
        Ok(())
    }

    /// Marks a task completed, setting `completed_at` to now.
    ///
    /// Completing an already-completed task just refreshes `completed_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] / [`TaskError::Forbidden`] as in
    /// [`Self::get`], or [`TaskError::Store`] if the store fails.
    pub async fn complete(&self, owner_id: &str, id: TaskId) -> Result<Task, TaskError> {
        let mut task = self.get(owner_id, id).await?;
        task.is_completed = true;
        task.completed_at = Some(self.clock.now());
        Ok(self.store.update(task).await?)
    }

    /// Aggregate counts for the owner's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Store`] if the store fails.
    pub async fn stats(&self, owner_id: &str) -> Result<TaskStats, TaskError> {
        let base = TaskFilter::owner(owner_id);
        let total = self.store.count(&base).await?;
        let completed = self
            .store
            .count(&TaskFilter {
                completed: Some(true),
                ..base.clone()
            })
            .await?;
        let pending = self
            .store
            .count(&TaskFilter {
                completed: Some(false),
                ..base.clone()
            })
            .await?;
        let overdue = self
            .store
            .count(&TaskFilter {
                completed: Some(false),
                due_before: Some(self.clock.now()),
                ..base
            })
            .await?;
        Ok(TaskStats {
            total,
            completed,
            pending,
            overdue,
        })
    }
}
