//! In-memory note and task stores for tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{NoteStore, TaskStore};
use crate::models::{
    NewNote, NewSubtask, NewTask, Note, NoteChanges, NoteSummary, Subtask, SubtaskChanges, Task,
    TaskChanges, TaskWithSubtasks,
};

#[derive(Default)]
pub struct InMemoryNoteStore {
    notes: Mutex<HashMap<Uuid, Note>>,
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn create(
        &self,
        owner_id: Uuid,
        note: NewNote,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Note> {
        let note = Note {
            id: Uuid::new_v4(),
            owner_id,
            title: note.title,
            content: note.content,
            summary: None,
            created_at: now,
            updated_at: now,
        };
        self.notes.lock().await.insert(note.id, note.clone());
        Ok(note)
    }

    async fn list(&self, owner_id: Uuid) -> DatabaseResult<Vec<Note>> {
        let notes = self.notes.lock().await;
        let mut owned: Vec<Note> = notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<Option<Note>> {
        let notes = self.notes.lock().await;
        Ok(notes.get(&id).filter(|n| n.owner_id == owner_id).cloned())
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: NoteChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Note>> {
        let mut notes = self.notes.lock().await;
        let Some(note) = notes.get_mut(&id).filter(|n| n.owner_id == owner_id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            note.title = title;
        }
        if let Some(content) = changes.content {
            note.content = content;
        }
        note.updated_at = now;
        Ok(Some(note.clone()))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let mut notes = self.notes.lock().await;
        if notes.get(&id).is_some_and(|n| n.owner_id == owner_id) {
            notes.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn write_summary(
        &self,
        owner_id: Uuid,
        id: Uuid,
        summary: &NoteSummary,
        observed_updated_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Note>> {
        let mut notes = self.notes.lock().await;
        let Some(note) = notes
            .get_mut(&id)
            .filter(|n| n.owner_id == owner_id && n.updated_at == observed_updated_at)
        else {
            return Ok(None);
        };

        note.updated_at = summary.version_marker;
        note.summary = Some(summary.clone());
        Ok(Some(note.clone()))
    }
}

#[derive(Default)]
struct TaskTables {
    tasks: HashMap<Uuid, Task>,
    subtasks: Vec<Subtask>,
}

#[derive(Default)]
pub struct InMemoryTaskStore {
    tables: Mutex<TaskTables>,
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(
        &self,
        owner_id: Uuid,
        task: NewTask,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            owner_id,
            title: task.title,
            description: task.description,
            completed: false,
            summary: None,
            last_summarized_at: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list(&self, owner_id: Uuid) -> DatabaseResult<Vec<Task>> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<Option<TaskWithSubtasks>> {
        let tables = self.tables.lock().await;
        let Some(task) = tables.tasks.get(&id).filter(|t| t.owner_id == owner_id) else {
            return Ok(None);
        };

        Ok(Some(TaskWithSubtasks {
            task: task.clone(),
            subtasks: tables
                .subtasks
                .iter()
                .filter(|s| s.task_id == id)
                .cloned()
                .collect(),
        }))
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: TaskChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Task>> {
        let mut tables = self.tables.lock().await;
        let Some(task) = tables.tasks.get_mut(&id).filter(|t| t.owner_id == owner_id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = Some(description);
        }
        if let Some(completed) = changes.completed {
            task.completed = completed;
        }
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.tasks.get(&id).is_some_and(|t| t.owner_id == owner_id) {
            return Ok(false);
        }

        tables.tasks.remove(&id);
        tables.subtasks.retain(|s| s.task_id != id);
        Ok(true)
    }

    async fn write_summary(
        &self,
        owner_id: Uuid,
        id: Uuid,
        summary: &str,
        summarized_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Task>> {
        let mut tables = self.tables.lock().await;
        let Some(task) = tables.tasks.get_mut(&id).filter(|t| t.owner_id == owner_id) else {
            return Ok(None);
        };

        task.summary = Some(summary.to_string());
        task.last_summarized_at = Some(summarized_at);
        Ok(Some(task.clone()))
    }

    async fn create_subtask(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        subtask: NewSubtask,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Subtask>> {
        let mut tables = self.tables.lock().await;
        let Some(task) = tables
            .tasks
            .get_mut(&task_id)
            .filter(|t| t.owner_id == owner_id)
        else {
            return Ok(None);
        };
        task.updated_at = now;

        let subtask = Subtask {
            id: Uuid::new_v4(),
            task_id,
            content: subtask.content,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        tables.subtasks.push(subtask.clone());
        Ok(Some(subtask))
    }

    async fn update_subtask(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        subtask_id: Uuid,
        changes: SubtaskChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Subtask>> {
        let mut tables = self.tables.lock().await;
        if !tables
            .tasks
            .get(&task_id)
            .is_some_and(|t| t.owner_id == owner_id)
        {
            return Ok(None);
        }

        let Some(subtask) = tables
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id && s.task_id == task_id)
        else {
            return Ok(None);
        };

        if let Some(content) = changes.content {
            subtask.content = content;
        }
        if let Some(completed) = changes.completed {
            subtask.completed = completed;
        }
        subtask.updated_at = now;
        Ok(Some(subtask.clone()))
    }

    async fn delete_subtask(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        subtask_id: Uuid,
        now: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        let TaskTables { tasks, subtasks } = &mut *tables;

        let Some(task) = tasks.get_mut(&task_id).filter(|t| t.owner_id == owner_id) else {
            return Ok(false);
        };

        let before = subtasks.len();
        subtasks.retain(|s| !(s.id == subtask_id && s.task_id == task_id));
        if subtasks.len() == before {
            return Ok(false);
        }

        task.updated_at = now;
        Ok(true)
    }
}
