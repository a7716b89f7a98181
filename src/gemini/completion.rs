//! Text completion client
//!
//! Wraps `models/{model}:generateContent` (single-shot) and
//! `models/{model}:streamGenerateContent?alt=sse` (incremental). The system
//! instruction uses Gemini's native `systemInstruction` field; conversation
//! history rides in `contents` as role-tagged turns.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use super::{describe_api_error, Content};
use crate::chat::ChatTurn;
use crate::errors::{AppError, Result};

/// One item on a completion stream. `Done` is the explicit end-of-stream
/// marker; the channel closes after it.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Fragment(String),
    Done,
}

/// Seam for text completion, substitutable in tests
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Single-shot completion returning the full reply text
    async fn complete(&self, system: &str, history: &[ChatTurn], message: &str)
        -> Result<String>;

    /// Streaming completion. The returned receiver yields text fragments,
    /// then a final `Done`, then closes. A lazy, finite, non-restartable
    /// sequence: an `Err` item followed by closure signals upstream failure.
    async fn complete_stream(
        &self,
        system: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<mpsc::Receiver<Result<StreamEvent>>>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 500,
            temperature: 0.9,
            top_p: 0.8,
            top_k: 40,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Gemini completion client
pub struct GeminiCompletion {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    request_timeout: Duration,
}

impl GeminiCompletion {
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        api_key: &str,
        model: &str,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            request_timeout,
        }
    }

    fn build_request(system: &str, history: &[ChatTurn], message: &str) -> GenerateRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content::text(turn.role.as_str(), &turn.text))
            .collect();
        contents.push(Content::text("user", message));

        GenerateRequest {
            system_instruction: Content::system(system),
            contents,
            generation_config: GenerationConfig::default(),
        }
    }
}

#[async_trait]
impl CompletionModel for GeminiCompletion {
    async fn complete(
        &self,
        system: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&Self::build_request(system, history, message))
            .send()
            .await
            .map_err(|e| AppError::external("gemini completion", format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external(
                "gemini completion",
                describe_api_error(status, &body),
            ));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            AppError::external("gemini completion", format!("invalid response: {e}"))
        })?;

        Ok(parsed.text())
    }

    async fn complete_stream(
        &self,
        system: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<mpsc::Receiver<Result<StreamEvent>>> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.endpoint, self.model, self.api_key
        );

        // No overall timeout here: the stream may legitimately stay open for
        // a long completion. Connect problems surface on send().
        let response = self
            .client
            .post(&url)
            .json(&Self::build_request(system, history, message))
            .send()
            .await
            .map_err(|e| AppError::external("gemini completion", format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external(
                "gemini completion",
                describe_api_error(status, &body),
            ));
        }

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut upstream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = upstream.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx
                            .send(Err(AppError::external(
                                "gemini completion",
                                format!("stream interrupted: {e}"),
                            )))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                for payload in drain_sse_data(&mut buffer) {
                    let Ok(parsed) = serde_json::from_str::<GenerateResponse>(&payload) else {
                        tracing::debug!("Skipping unparseable stream payload");
                        continue;
                    };

                    let text = parsed.text();
                    if text.is_empty() {
                        continue;
                    }

                    if tx.send(Ok(StreamEvent::Fragment(text))).await.is_err() {
                        // Receiver dropped: client went away, stop forwarding
                        return;
                    }
                }
            }

            let _ = tx.send(Ok(StreamEvent::Done)).await;
        });

        Ok(rx)
    }
}

/// Pull complete `data:` payloads out of an SSE byte buffer, leaving any
/// partial trailing line in place for the next chunk.
fn drain_sse_data(buffer: &mut String) -> Vec<String> {
    let mut payloads = Vec::new();

    while let Some(newline) = buffer.find('\n') {
        let line: String = buffer.drain(..=newline).collect();
        let line = line.trim_end();

        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim_start();
            if !data.is_empty() && data != "[DONE]" {
                payloads.push(data.to_string());
            }
        }
    }

    payloads
}
