//! Text embedding client
//!
//! Wraps the `models/{model}:embedContent` endpoint. An upstream error or an
//! empty vector is a hard failure; callers on the chat read path may choose
//! to degrade instead of propagating.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{describe_api_error, Content};
use crate::errors::{AppError, Result};

/// Seam for embedding generation, substitutable in tests
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Gemini embedding client
pub struct GeminiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/v1beta/models/{}:embedContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let request = EmbedRequest {
            content: Content::system(text),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::external("gemini embedding", format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external(
                "gemini embedding",
                describe_api_error(status, &body),
            ));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            AppError::external("gemini embedding", format!("invalid response: {e}"))
        })?;

        if parsed.embedding.values.is_empty() {
            return Err(AppError::external(
                "gemini embedding",
                "embedding response contained no values",
            ));
        }

        Ok(parsed.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_request_shape() {
        let request = EmbedRequest {
            content: Content::system("Buy milk - [pending]"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["content"]["parts"][0]["text"], "Buy milk - [pending]");
    }

    #[test]
    fn test_embed_response_parses_values() {
        let body = r#"{"embedding":{"values":[0.1,-0.2,0.3]}}"#;
        let parsed: EmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embedding.values, vec![0.1, -0.2, 0.3]);
    }
}
