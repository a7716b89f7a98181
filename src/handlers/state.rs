//! Application state shared across handlers

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::chat::ChatOrchestrator;
use crate::config::ServerConfig;
use crate::gemini::{CompletionModel, Embedder, GeminiCompletion, GeminiEmbedder};
use crate::store::TodoStore;

/// Application state type alias
pub type AppState = Arc<AppContext>;

/// Everything a request handler needs: the record store, the injected
/// Gemini clients, and the orchestrator wired on top of them.
pub struct AppContext {
    pub store: Arc<TodoStore>,
    pub embedder: Arc<dyn Embedder>,
    pub orchestrator: ChatOrchestrator,
    pub keep_alive_secs: u64,
}

impl AppContext {
    /// Construct production state from configuration
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        let embedder: Arc<dyn Embedder> = Arc::new(GeminiEmbedder::new(
            client.clone(),
            &config.gemini_endpoint,
            &config.gemini_api_key,
            &config.embedding_model,
        ));

        let completion: Arc<dyn CompletionModel> = Arc::new(GeminiCompletion::new(
            client,
            &config.gemini_endpoint,
            &config.gemini_api_key,
            &config.completion_model,
            Duration::from_secs(config.request_timeout_secs),
        ));

        let store = Arc::new(TodoStore::new(&config.data_dir)?);

        Self::with_parts(
            store,
            embedder,
            completion,
            config.persona.clone(),
            config.augment,
            config.keep_alive_secs,
        )
    }

    /// Construct state from explicit parts; tests plug in doubles here
    pub fn with_parts(
        store: Arc<TodoStore>,
        embedder: Arc<dyn Embedder>,
        completion: Arc<dyn CompletionModel>,
        persona: String,
        augment: bool,
        keep_alive_secs: u64,
    ) -> Result<Self> {
        let orchestrator = ChatOrchestrator::new(
            embedder.clone(),
            completion,
            store.clone(),
            persona,
            augment,
        );

        Ok(Self {
            store,
            embedder,
            orchestrator,
            keep_alive_secs,
        })
    }

    /// Flush pending writes, for graceful shutdown
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}
