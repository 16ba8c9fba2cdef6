//! Summary cache
//!
//! Serves a stored summary while it still describes the entity and asks the
//! summarizer for a new one otherwise. Notes use an exact version marker,
//! tasks use a newer-or-equal comparison over the task and its subtasks.

use common::{clock::Clock, error::DatabaseError};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    models::{NoteSummary, NoteSummaryRequest},
    repositories::{NoteStore, TaskStore},
    summarizer::{Summarizer, SummarizerError, SummaryKind},
};

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Summarization failed: {0}")]
    Summarization(#[source] SummarizerError),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

/// Result of a summary request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryOutcome {
    pub summary: String,
    pub cached: bool,
}

#[derive(Clone)]
pub struct SummaryService {
    notes: Arc<dyn NoteStore>,
    tasks: Arc<dyn TaskStore>,
    summarizer: Arc<dyn Summarizer>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl SummaryService {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        tasks: Arc<dyn TaskStore>,
        summarizer: Arc<dyn Summarizer>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            notes,
            tasks,
            summarizer,
            clock,
            timeout,
        }
    }

    async fn call_summarizer(
        &self,
        kind: SummaryKind,
        title: &str,
        sections: &[String],
    ) -> Result<String, SummaryError> {
        let summary = tokio::time::timeout(
            self.timeout,
            self.summarizer.summarize(kind, title, sections),
        )
        .await
        .map_err(|_| SummaryError::Summarization(SummarizerError::Timeout(self.timeout)))?
        .map_err(SummaryError::Summarization)?;

        if summary.trim().is_empty() {
            return Err(SummaryError::Summarization(SummarizerError::EmptyResponse));
        }
        Ok(summary)
    }

    /// Summary of a note, regenerated only when the note changed since the
    /// stored summary was written
    pub async fn note_summary(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        request: NoteSummaryRequest,
    ) -> Result<SummaryOutcome, SummaryError> {
        let note = self
            .notes
            .find(owner_id, note_id)
            .await?
            .ok_or(SummaryError::NotFound("Note"))?;

        let content = request.content.unwrap_or_else(|| note.content.clone());
        if content.trim().is_empty() {
            return Err(SummaryError::Validation(
                "Note content is empty. Cannot summarize.".to_string(),
            ));
        }

        if let Some(summary) = note.current_summary() {
            return Ok(SummaryOutcome {
                summary: summary.content.clone(),
                cached: true,
            });
        }

        let title = request.title.unwrap_or(note.title);
        let result = match self
            .call_summarizer(SummaryKind::Note, &title, &[content])
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!("Summarizing note {} failed: {}", note_id, e);
                return Err(e);
            }
        };

        let summary = NoteSummary {
            content: result,
            version_marker: self.clock.now(),
        };
        let stored = self
            .notes
            .write_summary(owner_id, note_id, &summary, note.updated_at)
            .await?;

        match stored {
            Some(_) => info!("Stored new summary for note {}", note_id),
            None => {
                // Edited or deleted while the summarizer ran
                self.notes
                    .find(owner_id, note_id)
                    .await?
                    .ok_or(SummaryError::NotFound("Note"))?;
                warn!(
                    "Note {} changed during summarization; summary not cached",
                    note_id
                );
            }
        }

        Ok(SummaryOutcome {
            summary: summary.content,
            cached: false,
        })
    }

    /// Summary of a task and its non-blank subtasks, regenerated only when
    /// one of them changed after the last summarization
    pub async fn task_summary(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
    ) -> Result<SummaryOutcome, SummaryError> {
        let task = self
            .tasks
            .find(owner_id, task_id)
            .await?
            .ok_or(SummaryError::NotFound("Task"))?;

        let sections: Vec<String> = task
            .qualifying_subtasks()
            .into_iter()
            .map(|subtask| subtask.content.clone())
            .collect();
        if sections.is_empty() {
            return Err(SummaryError::Validation(
                "No valid subtasks available for summarization".to_string(),
            ));
        }

        if let Some(summary) = task.current_summary() {
            return Ok(SummaryOutcome {
                summary: summary.to_string(),
                cached: true,
            });
        }

        // Edits landing while the summarizer runs are newer than this instant
        let summarized_at = self.clock.now();
        let result = match self
            .call_summarizer(SummaryKind::Task, &task.task.title, &sections)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!("Summarizing task {} failed: {}", task_id, e);
                return Err(e);
            }
        };

        self.tasks
            .write_summary(owner_id, task_id, &result, summarized_at)
            .await?
            .ok_or(SummaryError::NotFound("Task"))?;

        info!("Stored new summary for task {}", task_id);
        Ok(SummaryOutcome {
            summary: result,
            cached: false,
        })
    }
}
