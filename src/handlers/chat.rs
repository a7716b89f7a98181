//! Chat handlers: single-shot JSON and SSE streaming

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::error;

use super::state::AppState;
use super::types::{ChatRequest, ChatResponse, StreamChunk};
use crate::errors::{AppError, Result};
use crate::gemini::StreamEvent;

fn require_message(req: &ChatRequest) -> Result<String> {
    match &req.message {
        Some(message) if !message.trim().is_empty() => Ok(message.clone()),
        _ => Err(AppError::invalid_input("message", "Message is required")),
    }
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let message = require_message(&req)?;

    let reply = state.orchestrator.send_chat(&message, req.history).await?;

    Ok(Json(ChatResponse {
        response: reply.response,
        history: reply.history,
    }))
}

/// POST /api/chat/stream
///
/// Validation and the upstream handshake happen before the SSE response is
/// committed, so early failures still produce JSON error bodies. Once frames
/// are flowing, an upstream failure can only close the stream abruptly: no
/// `done` event means the consumer must treat the reply as failed.
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let message = require_message(&req)?;

    let rx = state
        .orchestrator
        .stream_chat(&message, req.history)
        .await?;

    let stream = ReceiverStream::new(rx).map_while(|item| match item {
        Ok(StreamEvent::Fragment(text)) => Some(Ok(frame("message", text, false))),
        Ok(StreamEvent::Done) => Some(Ok(frame("done", String::new(), true))),
        Err(e) => {
            // Headers are already committed; closing without a `done` frame
            // is the only error signal left.
            error!(error = %e, "Chat stream failed mid-flight");
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.keep_alive_secs))
            .event(Event::default().event("ping").data("{}")),
    ))
}

fn frame(name: &str, text: String, done: bool) -> Event {
    let chunk = StreamChunk {
        id: chrono::Utc::now().timestamp_millis(),
        text,
        done,
    };
    let data = serde_json::to_string(&chunk).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(name).data(data)
}
