//! Summarizer collaborator
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{env, time::Duration};
use thiserror::Error;
use tracing::debug;

/// What is being summarized; selects the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Note,
    Task,
}

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("Summarizer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Summarizer returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Summarizer returned an empty summary")]
    EmptyResponse,

    #[error("Summarizer timed out after {0:?}")]
    Timeout(Duration),
}

/// Text-to-summary function. Called only when no cached summary applies.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        kind: SummaryKind,
        title: &str,
        sections: &[String],
    ) -> Result<String, SummarizerError>;
}

/// Summarizer configuration
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl SummarizerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("SUMMARIZER_API_KEY")
            .context("SUMMARIZER_API_KEY environment variable not set")?;

        let base_url = env::var("SUMMARIZER_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let model = env::var("SUMMARIZER_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let timeout_secs = env::var("SUMMARIZER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("Invalid SUMMARIZER_TIMEOUT_SECS")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    n: u8,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn instructions(kind: SummaryKind) -> &'static str {
    match kind {
        SummaryKind::Note => {
            "You summarize personal notes. Reply with a short paragraph that captures the key \
             points of the note. Do not add information that is not in the note."
        }
        SummaryKind::Task => {
            "You summarize to-do items. Reply with one or two sentences describing what the \
             task involves and what remains to be done, based on its subtasks."
        }
    }
}

fn render_prompt(kind: SummaryKind, title: &str, sections: &[String]) -> String {
    match kind {
        SummaryKind::Note => format!("Title: {}\n\n{}", title, sections.join("\n\n")),
        SummaryKind::Task => {
            let mut prompt = format!("Task: {}\n\nSubtasks:\n", title);
            for section in sections {
                prompt.push_str("- ");
                prompt.push_str(section.trim());
                prompt.push('\n');
            }
            prompt
        }
    }
}

/// Summarizer backed by an OpenAI-compatible HTTP API
#[derive(Clone)]
pub struct HttpSummarizer {
    client: reqwest::Client,
    config: SummarizerConfig,
}

impl HttpSummarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build summarizer HTTP client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(
        &self,
        kind: SummaryKind,
        title: &str,
        sections: &[String],
    ) -> Result<String, SummarizerError> {
        let prompt = render_prompt(kind, title, sections);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instructions(kind),
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            n: 1,
        };

        debug!("Requesting {:?} summary from {}", kind, self.config.base_url);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(SummarizerError::EmptyResponse)
    }
}
