//! Request and response DTOs for the REST API

use serde::{Deserialize, Serialize};

use crate::chat::ChatTurn;
use crate::store::Todo;

/// Body of POST /api/chat and /api/chat/stream.
///
/// `message` is Option so a missing field maps to a 400 with a clear error
/// instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Response of POST /api/chat
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub history: Vec<ChatTurn>,
}

/// One SSE frame on the chat stream
#[derive(Debug, Serialize)]
pub struct StreamChunk {
    pub id: i64,
    pub text: String,
    pub done: bool,
}

/// Health probe response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Body of POST /todo
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

/// Envelope for todo list responses
#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<Todo>,
}

/// Envelope for single-todo responses
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub success: bool,
    pub message: String,
    pub data: Todo,
}

/// Envelope for data-less responses (delete)
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}
