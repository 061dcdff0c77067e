//! Task Data Structure
//!
//! Lightweight tasks tracked inside a room.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::shared::error::SharedError;
use crate::shared::ids::{MessageId, PrincipalId, RoomId, TaskId};

/// Longest title derived from a message
pub const MAX_DERIVED_TITLE_LEN: usize = 100;

/// Title used when nothing better is available
pub const DEFAULT_TASK_TITLE: &str = "New task";

/// Progress of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TaskStatus::Pending),
            "In Progress" => Ok(TaskStatus::InProgress),
            "Completed" => Ok(TaskStatus::Completed),
            other => Err(SharedError::validation(
                "status",
                format!("unknown task status '{}'", other),
            )),
        }
    }
}

/// A task belonging to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub room_id: RoomId,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<PrincipalId>,
    pub status: TaskStatus,
    pub deadline: Option<DateTime<Utc>>,
    /// Set when the task first moves into `Completed`
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: PrincipalId,
    /// Message this task was converted from, if any
    pub source_message_id: Option<MessageId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending task with a validated title
    pub fn new(room_id: RoomId, title: &str, created_by: PrincipalId) -> Result<Self, SharedError> {
        let now = Utc::now();
        Ok(Self {
            id: TaskId::new(),
            room_id,
            title: validate_task_title(title)?,
            description: None,
            assigned_to: None,
            status: TaskStatus::Pending,
            deadline: None,
            completed_at: None,
            created_by,
            source_message_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Fields left as `None` are untouched.
    pub fn apply_update(&mut self, update: UpdateTaskRequest, now: DateTime<Utc>) -> Result<(), SharedError> {
        if let Some(title) = update.title {
            self.title = validate_task_title(&title)?;
        }
        if let Some(description) = update.description {
            self.description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
        }
        if let Some(assigned_to) = update.assigned_to {
            self.assigned_to = Some(assigned_to);
        }
        if let Some(deadline) = update.deadline {
            self.deadline = Some(deadline);
        }
        if let Some(status) = update.status {
            if status == TaskStatus::Completed && self.status != TaskStatus::Completed {
                self.completed_at = Some(now);
            }
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Trim and validate a task title
pub fn validate_task_title(title: &str) -> Result<String, SharedError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(SharedError::validation("title", "Task title is required"));
    }
    Ok(trimmed.to_string())
}

/// Pick a title for a task converted from a message
///
/// An explicit title wins; otherwise the first characters of the message
/// text are used, and failing that the default title.
pub fn derive_task_title(explicit: Option<&str>, message_text: Option<&str>) -> String {
    if let Some(title) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    message_text
        .map(|text| text.chars().take(MAX_DERIVED_TITLE_LEN).collect::<String>())
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string())
}

/// Request to create a task in a room
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<PrincipalId>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial task update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<PrincipalId>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
}

/// Request to turn a chat message into a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertMessageRequest {
    pub room_id: RoomId,
    pub message_id: Option<MessageId>,
    pub title: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}
