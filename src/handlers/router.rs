//! Router configuration

use axum::{
    extract::OriginalUri,
    http::Method,
    routing::{get, post, put},
    Router,
};

use super::state::AppState;
use super::{chat, health, todos};
use crate::errors::AppError;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/chat", post(chat::chat))
        .route("/api/chat/stream", post(chat::chat_stream))
        .route("/todo", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/todo/{id}",
            put(todos::update_todo).delete(todos::delete_todo),
        )
        .fallback(not_found)
        .with_state(state)
}

/// Unmatched routes get the classic "Cannot <METHOD> <PATH>" body
async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
