//! Error taxonomy for task operations.
//!
//! Validation failures, not-found, and forbidden are distinct so the HTTP
//! layer can map them to 400, 404, and 403 respectively. Store failures
//! collapse into [`TaskError::Store`] and surface as a generic 500.

use thiserror::Error;

use crate::store::StoreError;
use crate::task::TaskId;

/// Errors that can occur during task service operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Title, due date, or reminder time missing (or title empty) on create.
    #[error("Please provide title, due date, and reminder time")]
    MissingFields,
    /// Title exceeds the maximum length.
    #[error("Title cannot exceed 100 characters")]
    TitleTooLong,
    /// Description exceeds the maximum length.
    #[error("Description cannot exceed 500 characters")]
    DescriptionTooLong,
    /// Due date is not in the future.
    #[error("Due date must be in the future")]
    DueDateNotFuture,
    /// Reminder time is not before the due date.
    #[error("Reminder time must be before due date")]
    ReminderAfterDue,
    /// Reminder time is not in the future.
    #[error("Reminder time must be in the future")]
    ReminderNotFuture,
    /// No task with the given id exists.
    #[error("Task not found: {0}")]
    NotFound(TaskId),
    /// The task exists but belongs to a different owner.
    #[error("Not authorized to access this task")]
    Forbidden,
    /// The backing store failed. The message is logged server-side, not
    /// returned to callers.
    #[error("store error: {0}")]
    Store(String),
}

impl TaskError {
    /// Whether this error is a boundary validation failure (HTTP 400).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingFields
                | Self::TitleTooLong
                | Self::DescriptionTooLong
                | Self::DueDateNotFuture
                | Self::ReminderAfterDue
                | Self::ReminderNotFuture
        )
    }
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            // The store re-checks the reminder/due invariant on every write.
            StoreError::ReminderAfterDue => Self::ReminderAfterDue,
            StoreError::Unavailable(msg) => Self::Store(msg),
        }
    }
}
