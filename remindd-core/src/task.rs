//! Task domain model for `remindd`.
//!
//! Defines the [`Task`] record, its identifier and priority types, and the
//! input shapes used by the task service for creation ([`NewTask`]) and
//! partial update ([`TaskPatch`]). The JSON wire representation uses
//! camelCase field names (`dueDate`, `reminderAt`, `isCompleted`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Priority level of a task. Serialized as `"low"`, `"medium"`, `"high"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority (the default for new tasks).
    #[default]
    Medium,
    /// High priority.
    High,
}

impl Priority {
    /// Returns the wire representation of this priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Semantic rank: low = 0, medium = 1, high = 2.
    ///
    /// Note that the `sortBy=priority` listing order does NOT use this rank;
    /// it compares the wire strings. See [`crate::store::TaskSort`].
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown priority value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid priority '{0}' (expected low, medium, or high)")]
pub struct ParsePriorityError(String);

impl std::str::FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

/// One reminder-bearing to-do item.
///
/// Invariant: `reminder_at < due_date`. The task service validates this at
/// the boundary and the store re-checks it on every insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, assigned at creation, immutable.
    pub id: TaskId,
    /// ID of the owning principal, immutable after creation.
    pub owner_id: String,
    /// Non-empty title, at most [`MAX_TITLE_LENGTH`] characters.
    pub title: String,
    /// Optional description, at most [`MAX_DESCRIPTION_LENGTH`] characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the task is due.
    pub due_date: DateTime<Utc>,
    /// When the owner should be reminded. Always before `due_date`.
    pub reminder_at: DateTime<Utc>,
    /// Priority level.
    pub priority: Priority,
    /// Whether the task has been completed.
    pub is_completed: bool,
    /// When the task was completed, if it has been.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether a reminder email has been sent for this task.
    pub is_notified: bool,
    /// When the record was created (stamped by the store).
    pub created_at: DateTime<Utc>,
    /// When the record was last written (stamped by the store).
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task. Owner, id, and timestamps are supplied by the
/// service and store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// When the task is due.
    pub due_date: DateTime<Utc>,
    /// When the owner should be reminded.
    pub reminder_at: DateTime<Utc>,
    /// Priority; defaults to [`Priority::Medium`] when `None`.
    pub priority: Option<Priority>,
}

/// Partial update to a task. `None` fields are left unchanged.
///
/// An empty-string title keeps the existing title, while an empty-string
/// description clears the description. This asymmetry is deliberate: a
/// title is mandatory, a description is not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title, if supplied.
    pub title: Option<String>,
    /// New description, if supplied. Empty clears it.
    pub description: Option<String>,
    /// New due date, if supplied.
    pub due_date: Option<DateTime<Utc>>,
    /// New reminder time, if supplied.
    pub reminder_at: Option<DateTime<Utc>>,
    /// New priority, if supplied.
    pub priority: Option<Priority>,
}
