//! Repositories for database operations
//!
//! Every lookup is scoped to the owning user. A record owned by someone else
//! is reported exactly like a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{
    NewNote, NewSubtask, NewTask, Note, NoteChanges, NoteSummary, Subtask, SubtaskChanges, Task,
    TaskChanges, TaskWithSubtasks,
};

#[cfg(test)]
pub mod memory;
pub mod note;
pub mod task;

pub use note::NoteRepository;
pub use task::TaskRepository;

/// Persistent access to notes
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create(&self, owner_id: Uuid, note: NewNote, now: DateTime<Utc>)
    -> DatabaseResult<Note>;

    async fn list(&self, owner_id: Uuid) -> DatabaseResult<Vec<Note>>;

    async fn find(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<Option<Note>>;

    /// Apply the changes and stamp `updated_at` with `now`
    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: NoteChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Note>>;

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<bool>;

    /// Store the summary and set `updated_at` to its version marker in a
    /// single write. Nothing is written (and `None` returned) unless the
    /// note's `updated_at` still equals `observed_updated_at`.
    async fn write_summary(
        &self,
        owner_id: Uuid,
        id: Uuid,
        summary: &NoteSummary,
        observed_updated_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Note>>;
}

/// Persistent access to tasks and their subtasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, owner_id: Uuid, task: NewTask, now: DateTime<Utc>)
    -> DatabaseResult<Task>;

    async fn list(&self, owner_id: Uuid) -> DatabaseResult<Vec<Task>>;

    async fn find(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<Option<TaskWithSubtasks>>;

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: TaskChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Task>>;

    /// Delete a task together with its subtasks
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<bool>;

    /// Store the summary and the instant it was generated. `updated_at` is
    /// left untouched.
    async fn write_summary(
        &self,
        owner_id: Uuid,
        id: Uuid,
        summary: &str,
        summarized_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Task>>;

    /// Add a subtask; the parent task's `updated_at` moves to `now`
    async fn create_subtask(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        subtask: NewSubtask,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Subtask>>;

    async fn update_subtask(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        subtask_id: Uuid,
        changes: SubtaskChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Subtask>>;

    /// Remove a subtask; the parent task's `updated_at` moves to `now`
    async fn delete_subtask(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        subtask_id: Uuid,
        now: DateTime<Utc>,
    ) -> DatabaseResult<bool>;
}
