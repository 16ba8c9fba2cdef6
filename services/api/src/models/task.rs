//! Task and subtask models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub summary: Option<String>,
    pub last_summarized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subtask entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subtask {
    pub id: Uuid,
    pub task_id: Uuid,
    pub content: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task with its subtasks in creation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskWithSubtasks {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Subtask>,
}

impl TaskWithSubtasks {
    /// Subtasks that take part in summarization: those with non-blank content
    pub fn qualifying_subtasks(&self) -> Vec<&Subtask> {
        self.subtasks
            .iter()
            .filter(|subtask| !subtask.content.trim().is_empty())
            .collect()
    }

    /// The stored summary if nothing it covers changed after it was written.
    ///
    /// Newer-or-equal: a change stamped at exactly the summarization instant
    /// still counts as covered.
    pub fn current_summary(&self) -> Option<&str> {
        let last_summarized_at = self.task.last_summarized_at.unwrap_or(DateTime::UNIX_EPOCH);

        let task_covered = last_summarized_at >= self.task.updated_at;
        let subtasks_covered = self
            .qualifying_subtasks()
            .iter()
            .all(|subtask| last_summarized_at >= subtask.updated_at);

        match self.task.summary.as_deref() {
            Some(summary) if !summary.is_empty() && task_covered && subtasks_covered => {
                Some(summary)
            }
            _ => None,
        }
    }
}

/// Task creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

/// Task update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Subtask creation payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSubtask {
    #[serde(default)]
    pub content: String,
}

/// Subtask update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubtaskChanges {
    pub content: Option<String>,
    pub completed: Option<bool>,
}

impl SubtaskChanges {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.completed.is_none()
    }
}
