//! Note repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::NoteStore;
use crate::models::{NewNote, Note, NoteChanges, NoteSummary};

/// Note repository
#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    /// Create a new note repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn note_from_row(row: &PgRow) -> Note {
    let summary_content: Option<String> = row.get("summary_content");
    let version_marker: Option<DateTime<Utc>> = row.get("summary_version_marker");

    Note {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        content: row.get("content"),
        summary: summary_content
            .zip(version_marker)
            .map(|(content, version_marker)| NoteSummary {
                content,
                version_marker,
            }),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl NoteStore for NoteRepository {
    async fn create(
        &self,
        owner_id: Uuid,
        note: NewNote,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Note> {
        info!("Creating note for user {}", owner_id);

        let row = sqlx::query(
            r#"
            INSERT INTO notes (id, owner_id, title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, owner_id, title, content, summary_content, summary_version_marker,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(note_from_row(&row))
    }

    async fn list(&self, owner_id: Uuid) -> DatabaseResult<Vec<Note>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, content, summary_content, summary_version_marker,
                   created_at, updated_at
            FROM notes
            WHERE owner_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<Option<Note>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, title, content, summary_content, summary_version_marker,
                   created_at, updated_at
            FROM notes
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: NoteChanges,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Note>> {
        let row = sqlx::query(
            r#"
            UPDATE notes
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                updated_at = $5
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, content, summary_content, summary_version_marker,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(changes.title)
        .bind(changes.content)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM notes
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
        summary: &NoteSummary,
        observed_updated_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Note>> {
        let row = sqlx::query(
            r#"
            UPDATE notes
            SET summary_content = $3,
                summary_version_marker = $4,
                updated_at = $4
            WHERE id = $1 AND owner_id = $2 AND updated_at = $5
            RETURNING id, owner_id, title, content, summary_content, summary_version_marker,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&summary.content)
        .bind(summary.version_marker)
        .bind(observed_updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(note_from_row))
    }
}
