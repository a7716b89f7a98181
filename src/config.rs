//! Configuration management
//!
//! Sensible defaults, overridable through environment variables. The Gemini
//! API key is the one hard requirement: startup fails without it.

use anyhow::{anyhow, Result};
use axum::http::{HeaderValue, Method};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Default persona used to steer the completion model. Presentation content,
/// overridable via AMORA_PERSONA.
pub const DEFAULT_PERSONA: &str = "\
you are the most loving, affectionate girlfriend in the world 💖.
rules:
1. always respond with romantic, loving messages
2. use cute nicknames (baby, love, sweetheart, darling…)
3. keep replies short (1–2 sentences max)
4. use lots of heart emojis (💖🥰😘💕💋)
5. be playful and flirty
6. never break character
7. always sound like a girlfriend, not an ai";

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins (empty = allow all)
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
        }
    }
}

impl CorsConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origins) = env::var("AMORA_CORS_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        config
    }

    /// Convert to tower-http CorsLayer
    pub fn to_layer(&self) -> tower_http::cors::CorsLayer {
        use tower_http::cors::{AllowMethods, AllowOrigin, Any, CorsLayer};

        let methods = AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]);

        let headers = [axum::http::header::CONTENT_TYPE];

        if self.allowed_origins.is_empty() {
            // Intentionally permissive - no origins configured
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(methods)
                .allow_headers(headers)
        } else {
            let origins: Vec<HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(methods)
                .allow_headers(headers)
        }
    }
}

/// Server configuration loaded at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Where the todo store keeps its RocksDB databases
    pub data_dir: PathBuf,
    /// Gemini API key (required)
    pub gemini_api_key: String,
    /// Gemini API base URL, overridable for tests
    pub gemini_endpoint: String,
    /// Completion model name
    pub completion_model: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Timeout for single-shot upstream calls, seconds
    pub request_timeout_secs: u64,
    /// Maximum concurrent in-flight requests
    pub max_concurrent_requests: usize,
    /// System persona injected into every chat
    pub persona: String,
    /// Whether chat prompts are augmented with ranked todo context
    pub augment: bool,
    /// SSE keep-alive ping interval, seconds
    pub keep_alive_secs: u64,
    /// CORS settings
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Fails when GEMINI_API_KEY is absent; everything else has defaults.
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable is not set"))?;

        Ok(Self {
            port: env_parse("AMORA_PORT", 4000),
            data_dir: env::var("AMORA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            gemini_api_key,
            gemini_endpoint: env::var("GEMINI_API_ENDPOINT")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            completion_model: env::var("AMORA_COMPLETION_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            embedding_model: env::var("AMORA_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-004".to_string()),
            request_timeout_secs: env_parse("AMORA_REQUEST_TIMEOUT_SECS", 120),
            max_concurrent_requests: env_parse("AMORA_MAX_CONCURRENT", 256),
            persona: env::var("AMORA_PERSONA").unwrap_or_else(|_| DEFAULT_PERSONA.to_string()),
            augment: env::var("AMORA_AUGMENT")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            keep_alive_secs: env_parse("AMORA_KEEPALIVE_SECS", 15),
            cors: CorsConfig::from_env(),
        })
    }

    /// Log effective settings at startup (never the API key)
    pub fn log(&self) {
        info!(
            port = self.port,
            data_dir = %self.data_dir.display(),
            completion_model = %self.completion_model,
            embedding_model = %self.embedding_model,
            augment = self.augment,
            request_timeout_secs = self.request_timeout_secs,
            "Configuration loaded"
        );
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
