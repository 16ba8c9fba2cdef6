//! Task repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::TaskStore;
use crate::models::{
    NewSubtask, NewTask, Subtask, SubtaskChanges, Task, TaskChanges, TaskWithSubtasks,
};

/// Task repository
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    /// Create a new task repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn task_from_row(row: &PgRow) -> Task {
    Task {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        completed: row.get("completed"),
        summary: row.get("summary"),
        last_summarized_at: row.get("last_summarized_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn subtask_from_row(row: &PgRow) -> Subtask {
    Subtask {
        id: row.get("id"),
        task_id: row.get("task_id"),
        content: row.get("content"),
        completed: row.get("completed"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl TaskStore for TaskRepository {
    async fn create(
        &self,
        owner_id: Uuid,
        task: NewTask,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Task> {
        info!("Creating task for user {}", owner_id);

        let row = sqlx::query(
            r#"
            INSERT INTO tasks (id, owner_id, title, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, owner_id, title, description, completed, summary, last_summarized_at,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(task_from_row(&row))
    }

    async fn list(&self, owner_id: Uuid) -> DatabaseResult<Vec<Task>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, completed, summary, last_summarized_at,
                   created_at, updated_at
            FROM tasks
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(task_from_row).collect())
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<Option<TaskWithSubtasks>> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, completed, summary, last_summarized_at,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let subtasks = sqlx::query(
            r#"
            SELECT id, task_id, content, completed, created_at, updated_at
            FROM subtasks
            WHERE task_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(TaskWithSubtasks {
            task: task_from_row(&row),
            subtasks: subtasks.iter().map(subtask_from_row).collect(),
        }))
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: TaskChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Task>> {
        let row = sqlx::query(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                completed = COALESCE($5, completed),
                updated_at = $6
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, completed, summary, last_summarized_at,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.completed)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(task_from_row))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        // Subtasks go with it through ON DELETE CASCADE
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn write_summary(
        &self,
        owner_id: Uuid,
        id: Uuid,
        summary: &str,
        summarized_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Task>> {
        let row = sqlx::query(
            r#"
            UPDATE tasks
            SET summary = $3,
                last_summarized_at = $4
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, completed, summary, last_summarized_at,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(summary)
        .bind(summarized_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(task_from_row))
    }

    async fn create_subtask(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        subtask: NewSubtask,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Subtask>> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query(
            r#"
            UPDATE tasks
            SET updated_at = $3
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(task_id)
        .bind(owner_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(
            r#"
            INSERT INTO subtasks (id, task_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, task_id, content, completed, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(&subtask.content)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(subtask_from_row(&row)))
    }

    async fn update_subtask(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        subtask_id: Uuid,
        changes: SubtaskChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Subtask>> {
        let row = sqlx::query(
            r#"
            UPDATE subtasks AS s
            SET content = COALESCE($4, s.content),
                completed = COALESCE($5, s.completed),
                updated_at = $6
            FROM tasks AS t
            WHERE s.id = $1 AND s.task_id = $2 AND t.id = s.task_id AND t.owner_id = $3
            RETURNING s.id, s.task_id, s.content, s.completed, s.created_at, s.updated_at
            "#,
        )
        .bind(subtask_id)
        .bind(task_id)
        .bind(owner_id)
        .bind(changes.content)
        .bind(changes.completed)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(subtask_from_row))
    }

    async fn delete_subtask(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        subtask_id: Uuid,
        now: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            r#"
            DELETE FROM subtasks AS s
            USING tasks AS t
            WHERE s.id = $1 AND s.task_id = $2 AND t.id = s.task_id AND t.owner_id = $3
            "#,
        )
        .bind(subtask_id)
        .bind(task_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        if removed.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE tasks
            SET updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(task_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }
}
