//! Note models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cached summary of a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub content: String,
    /// The note's `updated_at` at the moment the summary was written
    pub version_marker: DateTime<Utc>,
}

/// Note entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub summary: Option<NoteSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// The stored summary if it still describes the current content.
    ///
    /// Exact match: any change to `updated_at`, forwards or backwards,
    /// makes the summary stale.
    pub fn current_summary(&self) -> Option<&NoteSummary> {
        self.summary
            .as_ref()
            .filter(|summary| !summary.content.is_empty())
            .filter(|summary| summary.version_marker == self.updated_at)
    }
}

/// Note creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Note update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Body of a summary request. Fields left out fall back to the stored note.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteSummaryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}
