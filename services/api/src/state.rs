//! Application state shared across handlers

use common::{clock::Clock, jwt::JwtService};
use std::sync::Arc;

use crate::{
    repositories::{NoteStore, TaskStore},
    summary::SummaryService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn NoteStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub summaries: SummaryService,
    pub jwt_service: Arc<JwtService>,
    pub clock: Arc<dyn Clock>,
}
