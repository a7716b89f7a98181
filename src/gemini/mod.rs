//! Gemini API clients
//!
//! Thin wrappers over the generative-language REST API: one client for text
//! embeddings, one for completions (single-shot and streamed). Both are
//! hidden behind traits so the orchestrator can be driven by test doubles.

pub mod completion;
pub mod embedding;

pub use completion::{CompletionModel, GeminiCompletion, StreamEvent};
pub use embedding::{Embedder, GeminiEmbedder};

use serde::{Deserialize, Serialize};

/// One part of a Gemini content block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// A role-tagged content block on the Gemini wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    /// System instructions carry no role
    pub fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

/// Gemini error envelope
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Turn a non-2xx upstream body into a readable failure reason
pub(crate) fn describe_api_error(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiError>(body) {
        format!(
            "Gemini API error ({}): {} - {}",
            status,
            parsed.error.status.unwrap_or_else(|| "Unknown".to_string()),
            parsed.error.message
        )
    } else {
        format!("Gemini API error ({status}): {body}")
    }
}
