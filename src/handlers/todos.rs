//! Todo CRUD handlers
//!
//! Creation embeds `"<title> - [<status>]"` before persisting; an update
//! that touches title or status recomputes the embedding so ranking never
//! runs on stale vectors.

use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use super::state::AppState;
use super::types::{AckResponse, CreateTodoRequest, TodoListResponse, TodoResponse};
use crate::errors::{AppError, Result, ValidationErrorExt};
use crate::store::{Todo, TodoPatch};
use crate::validation;

/// GET /todo
pub async fn list_todos(State(state): State<AppState>) -> Result<Json<TodoListResponse>> {
    let data = state.store.list()?;

    Ok(Json(TodoListResponse {
        success: true,
        message: "Todos fetched 💖".to_string(),
        data,
    }))
}

/// POST /todo
pub async fn create_todo(
    State(state): State<AppState>,
    Json(req): Json<CreateTodoRequest>,
) -> Result<Json<TodoResponse>> {
    let title = req
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::invalid_input("title", "Title is required"))?;
    validation::validate_title(title).map_validation_err("title")?;

    let priority = req
        .priority
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::invalid_input("priority", "Priority is required"))?;
    validation::validate_label("priority", priority).map_validation_err("priority")?;

    if let Some(ref status) = req.status {
        validation::validate_label("status", status).map_validation_err("status")?;
    }

    let mut todo = Todo::new(
        title.to_string(),
        req.description,
        req.status,
        priority.to_string(),
    );

    // Embedding failure is a hard failure on the write path: a record
    // without a vector would be invisible to ranking.
    todo.embedding = state.embedder.embed(&todo.embedding_text()).await?;

    state.store.put(&todo)?;

    tracing::info!(todo_id = %todo.id, dims = todo.embedding.len(), "Created todo");

    Ok(Json(TodoResponse {
        success: true,
        message: "Todo saved with embedding 💖".to_string(),
        data: todo,
    }))
}

/// PUT /todo/{id}
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TodoPatch>,
) -> Result<Json<TodoResponse>> {
    if let Some(ref title) = patch.title {
        validation::validate_title(title).map_validation_err("title")?;
    }
    if let Some(ref status) = patch.status {
        validation::validate_label("status", status).map_validation_err("status")?;
    }
    if let Some(ref priority) = patch.priority {
        validation::validate_label("priority", priority).map_validation_err("priority")?;
    }

    let mut todo = state
        .store
        .get(&id)?
        .ok_or_else(|| AppError::TodoNotFound(id.to_string()))?;

    let embedding_stale = patch.apply(&mut todo);
    if embedding_stale {
        todo.embedding = state.embedder.embed(&todo.embedding_text()).await?;
    }

    state.store.put(&todo)?;

    tracing::debug!(todo_id = %todo.id, re_embedded = embedding_stale, "Updated todo");

    Ok(Json(TodoResponse {
        success: true,
        message: "Todo updated 💖".to_string(),
        data: todo,
    }))
}

/// DELETE /todo/{id}
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AckResponse>> {
    state.store.delete(&id)?;

    Ok(Json(AckResponse {
        success: true,
        message: "Todo deleted 💖".to_string(),
    }))
}
