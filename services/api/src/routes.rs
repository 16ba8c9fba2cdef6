//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use common::guard::{AuthUser, require_access_token};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        NewNote, NewSubtask, NewTask, NoteChanges, NoteSummaryRequest, SubtaskChanges, TaskChanges,
    },
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/notes", post(create_note).get(list_notes))
        .route(
            "/api/v1/notes/:id",
            get(get_note).patch(update_note).delete(delete_note),
        )
        .route("/api/v1/tasks", post(create_task).get(list_tasks))
        .route(
            "/api/v1/tasks/:id",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/api/v1/tasks/:id/subtask", post(create_subtask))
        .route(
            "/api/v1/tasks/:id/subtask/:subtask_id",
            patch(update_subtask).delete(delete_subtask),
        )
        .route("/api/v1/ai/notes/:id/summary", post(summarize_note))
        .route("/api/v1/ai/tasks/:id/summary", get(summarize_task))
        .route_layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            require_access_token,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/ping", get(ping))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

pub async fn ping() -> impl IntoResponse {
    Json(json!({ "message": "pong" }))
}

fn required_title(title: &str) -> ApiResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    Ok(title.to_string())
}

// Notes

pub async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewNote>,
) -> ApiResult<impl IntoResponse> {
    let note = NewNote {
        title: required_title(&payload.title)?,
        content: payload.content,
    };

    let note = state.notes.create(user.id, note, state.clock.now()).await?;
    info!("Created note {}", note.id);

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let notes = state.notes.list(user.id).await?;
    Ok(Json(notes))
}

pub async fn get_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let note = state
        .notes
        .find(user.id, id)
        .await?
        .ok_or(ApiError::NotFound("Note"))?;
    Ok(Json(note))
}

pub async fn update_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NoteChanges>,
) -> ApiResult<impl IntoResponse> {
    if payload.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }
    let changes = NoteChanges {
        title: payload.title.as_deref().map(required_title).transpose()?,
        content: payload.content,
    };

    let note = state
        .notes
        .update(user.id, id, changes, state.clock.now())
        .await?
        .ok_or(ApiError::NotFound("Note"))?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.notes.delete(user.id, id).await? {
        return Err(ApiError::NotFound("Note"));
    }
    info!("Deleted note {}", id);
    Ok(StatusCode::NO_CONTENT)
}

// Tasks

pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewTask>,
) -> ApiResult<impl IntoResponse> {
    let task = NewTask {
        title: required_title(&payload.title)?,
        description: payload.description,
    };

    let task = state.tasks.create(user.id, task, state.clock.now()).await?;
    info!("Created task {}", task.id);

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let tasks = state.tasks.list(user.id).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let task = state
        .tasks
        .find(user.id, id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskChanges>,
) -> ApiResult<impl IntoResponse> {
    if payload.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }
    let changes = TaskChanges {
        title: payload.title.as_deref().map(required_title).transpose()?,
        ..payload
    };

    let task = state
        .tasks
        .update(user.id, id, changes, state.clock.now())
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.tasks.delete(user.id, id).await? {
        return Err(ApiError::NotFound("Task"));
    }
    info!("Deleted task {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_subtask(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<NewSubtask>,
) -> ApiResult<impl IntoResponse> {
    let subtask = state
        .tasks
        .create_subtask(user.id, task_id, payload, state.clock.now())
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

pub async fn update_subtask(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SubtaskChanges>,
) -> ApiResult<impl IntoResponse> {
    if payload.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let subtask = state
        .tasks
        .update_subtask(user.id, task_id, subtask_id, payload, state.clock.now())
        .await?
        .ok_or(ApiError::NotFound("Subtask"))?;
    Ok(Json(subtask))
}

pub async fn delete_subtask(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let removed = state
        .tasks
        .delete_subtask(user.id, task_id, subtask_id, state.clock.now())
        .await?;
    if !removed {
        return Err(ApiError::NotFound("Subtask"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Summaries

/// Summarize a note. The body may carry unsaved title/content.
pub async fn summarize_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Option<Json<NoteSummaryRequest>>,
) -> ApiResult<impl IntoResponse> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let outcome = state.summaries.note_summary(user.id, id, request).await?;
    Ok(Json(outcome))
}

pub async fn summarize_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.summaries.task_summary(user.id, id).await?;
    Ok(Json(outcome))
}
