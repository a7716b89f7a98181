//! Chat orchestration
//!
//! Composition root for the chat flow: validate the message, embed it, rank
//! stored todos by cosine similarity, fold the top matches into the persona
//! system instruction, then call the completion model (single-shot or
//! streaming). Conversation history is caller-supplied and echoed back
//! extended with the new turn pair; no session state lives server-side.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::{Result, ValidationErrorExt};
use crate::gemini::{CompletionModel, Embedder, StreamEvent};
use crate::similarity::top_k_similar;
use crate::store::TodoStore;
use crate::validation;

/// How many ranked todos are folded into the prompt
const CONTEXT_TOP_K: usize = 3;

/// Who spoke a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Result of a single-shot chat call
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub history: Vec<ChatTurn>,
}

/// Orchestrates embedding, ranking, prompt assembly and completion.
///
/// Dependencies are injected at construction so tests can substitute the
/// external clients with doubles.
pub struct ChatOrchestrator {
    embedder: Arc<dyn Embedder>,
    completion: Arc<dyn CompletionModel>,
    store: Arc<TodoStore>,
    persona: String,
    augment: bool,
}

impl ChatOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        completion: Arc<dyn CompletionModel>,
        store: Arc<TodoStore>,
        persona: String,
        augment: bool,
    ) -> Self {
        Self {
            embedder,
            completion,
            store,
            persona,
            augment,
        }
    }

    /// Single-shot chat: returns the reply plus the extended history
    pub async fn send_chat(&self, message: &str, history: Vec<ChatTurn>) -> Result<ChatReply> {
        validation::validate_message(message).map_validation_err("message")?;
        validation::validate_history_len(history.len()).map_validation_err("history")?;

        let system = self.system_instruction(message).await?;
        let response = self.completion.complete(&system, &history, message).await?;

        let mut extended = history;
        extended.push(ChatTurn::user(message));
        extended.push(ChatTurn::model(response.clone()));

        Ok(ChatReply {
            response,
            history: extended,
        })
    }

    /// Streaming chat: returns a receiver of fragments ending in `Done`
    pub async fn stream_chat(
        &self,
        message: &str,
        history: Vec<ChatTurn>,
    ) -> Result<mpsc::Receiver<Result<StreamEvent>>> {
        validation::validate_message(message).map_validation_err("message")?;
        validation::validate_history_len(history.len()).map_validation_err("history")?;

        let system = self.system_instruction(message).await?;
        self.completion
            .complete_stream(&system, &history, message)
            .await
    }

    /// Compose the persona system instruction, with a todo context block when
    /// augmentation is on and the message embeds cleanly.
    async fn system_instruction(&self, message: &str) -> Result<String> {
        match self.context_block(message).await? {
            Some(context) => Ok(format!(
                "{}\n\nrelevant todos for context:\n{}",
                self.persona, context
            )),
            None => Ok(self.persona.clone()),
        }
    }

    /// Rank stored todos against the message embedding and render the top
    /// matches. Embedding failure degrades to no context rather than
    /// failing the whole request; store failure still propagates.
    async fn context_block(&self, message: &str) -> Result<Option<String>> {
        if !self.augment {
            return Ok(None);
        }

        let query = match self.embedder.embed(message).await {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, "Embedding failed, continuing without todo context");
                return Ok(None);
            }
        };

        let todos = self.store.list()?;
        if todos.is_empty() {
            return Ok(None);
        }

        let candidates: Vec<(Vec<f32>, String)> = todos
            .iter()
            .map(|t| (t.embedding.clone(), t.context_line()))
            .collect();

        let top = top_k_similar(&query, &candidates, CONTEXT_TOP_K);
        debug!(candidates = todos.len(), selected = top.len(), "Ranked todos for chat context");

        let lines: Vec<String> = top.into_iter().map(|(_, line)| line).collect();
        Ok(Some(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::store::Todo;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeEmbedder {
        result: std::result::Result<Vec<f32>, String>,
        called: AtomicBool,
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.called.store(true, Ordering::SeqCst);
            self.result
                .clone()
                .map_err(|e| AppError::external("gemini embedding", e))
        }
    }

    struct FakeCompletion {
        reply: String,
        fragments: Vec<String>,
        seen_system: Mutex<Option<String>>,
        called: AtomicBool,
    }

    impl FakeCompletion {
        fn new(reply: &str, fragments: &[&str]) -> Self {
            Self {
                reply: reply.to_string(),
                fragments: fragments.iter().map(|s| s.to_string()).collect(),
                seen_system: Mutex::new(None),
                called: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl CompletionModel for FakeCompletion {
        async fn complete(
            &self,
            system: &str,
            _history: &[ChatTurn],
            _message: &str,
        ) -> Result<String> {
            self.called.store(true, Ordering::SeqCst);
            *self.seen_system.lock().unwrap() = Some(system.to_string());
            Ok(self.reply.clone())
        }

        async fn complete_stream(
            &self,
            system: &str,
            _history: &[ChatTurn],
            _message: &str,
        ) -> Result<mpsc::Receiver<Result<StreamEvent>>> {
            self.called.store(true, Ordering::SeqCst);
            *self.seen_system.lock().unwrap() = Some(system.to_string());

            let (tx, rx) = mpsc::channel(8);
            let fragments = self.fragments.clone();
            tokio::spawn(async move {
                for fragment in fragments {
                    let _ = tx.send(Ok(StreamEvent::Fragment(fragment))).await;
                }
                let _ = tx.send(Ok(StreamEvent::Done)).await;
            });
            Ok(rx)
        }
    }

    fn harness(
        embed: std::result::Result<Vec<f32>, String>,
        completion: FakeCompletion,
        augment: bool,
        seed: Vec<Todo>,
    ) -> (ChatOrchestrator, Arc<FakeEmbedder>, Arc<FakeCompletion>, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let store = Arc::new(TodoStore::new(dir.path()).expect("open store"));
        for todo in &seed {
            store.put(todo).expect("seed todo");
        }
        let embedder = Arc::new(FakeEmbedder {
            result: embed,
            called: AtomicBool::new(false),
        });
        let completion = Arc::new(completion);
        let orchestrator = ChatOrchestrator::new(
            embedder.clone(),
            completion.clone(),
            store,
            "be sweet".to_string(),
            augment,
        );
        (orchestrator, embedder, completion, dir)
    }

    fn seeded_todo(title: &str, embedding: Vec<f32>) -> Todo {
        let mut todo = Todo::new(title.to_string(), None, None, "high".to_string());
        todo.embedding = embedding;
        todo
    }

    #[tokio::test]
    async fn test_round_trip_history() {
        let (orch, _, _, _dir) = harness(
            Ok(vec![1.0, 0.0]),
            FakeCompletion::new("hey you 💖", &[]),
            true,
            Vec::new(),
        );

        let prior = vec![ChatTurn::user("hi"), ChatTurn::model("hello!")];
        let reply = orch.send_chat("miss me?", prior.clone()).await.unwrap();

        assert_eq!(reply.response, "hey you 💖");
        assert_eq!(reply.history.len(), 4);
        assert_eq!(reply.history[0].text, prior[0].text);
        assert_eq!(reply.history[2].role, Role::User);
        assert_eq!(reply.history[2].text, "miss me?");
        assert_eq!(reply.history[3].role, Role::Model);
        assert_eq!(reply.history[3].text, "hey you 💖");
    }

    #[tokio::test]
    async fn test_empty_message_rejected_before_any_external_call() {
        let (orch, embedder, completion, _dir) =
            harness(Ok(vec![1.0]), FakeCompletion::new("x", &[]), true, Vec::new());

        let err = orch.send_chat("  ", Vec::new()).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
        assert!(!embedder.called.load(Ordering::SeqCst));
        assert!(!completion.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_base_persona() {
        // A stored todo exists, but without a query embedding it must not
        // make it into the prompt.
        let (orch, _, completion, _dir) = harness(
            Err("upstream down".to_string()),
            FakeCompletion::new("still here 💕", &[]),
            true,
            vec![seeded_todo("Buy milk", vec![1.0, 0.0])],
        );

        let reply = orch.send_chat("hello", Vec::new()).await.unwrap();
        assert_eq!(reply.response, "still here 💕");

        let system = completion.seen_system.lock().unwrap().clone().unwrap();
        assert_eq!(system, "be sweet");
    }

    #[tokio::test]
    async fn test_context_block_carries_top_ranked_todos() {
        let dir = TempDir::new().expect("temp dir");
        let store = Arc::new(TodoStore::new(dir.path()).expect("open store"));
        store.put(&seeded_todo("Buy milk", vec![1.0, 0.0])).unwrap();
        store.put(&seeded_todo("Walk dog", vec![0.0, 1.0])).unwrap();

        let embedder = Arc::new(FakeEmbedder {
            result: Ok(vec![1.0, 0.0]),
            called: AtomicBool::new(false),
        });
        let completion = Arc::new(FakeCompletion::new("done 😘", &[]));
        let orch = ChatOrchestrator::new(
            embedder,
            completion.clone(),
            store,
            "be sweet".to_string(),
            true,
        );

        orch.send_chat("do I need groceries?", Vec::new())
            .await
            .unwrap();

        let system = completion.seen_system.lock().unwrap().clone().unwrap();
        assert!(system.starts_with("be sweet"));
        assert!(system.contains("Buy milk [pending]"));
        // Best match is listed first
        let milk = system.find("Buy milk").unwrap();
        let dog = system.find("Walk dog").unwrap();
        assert!(milk < dog);
    }

    #[tokio::test]
    async fn test_augmentation_toggle_skips_embedding() {
        let (orch, embedder, completion, _dir) =
            harness(Ok(vec![1.0]), FakeCompletion::new("plain 💖", &[]), false, Vec::new());

        orch.send_chat("hello", Vec::new()).await.unwrap();

        assert!(!embedder.called.load(Ordering::SeqCst));
        let system = completion.seen_system.lock().unwrap().clone().unwrap();
        assert_eq!(system, "be sweet");
    }

    #[tokio::test]
    async fn test_stream_chat_yields_fragments_then_done() {
        let (orch, _, _, _dir) = harness(
            Ok(vec![1.0]),
            FakeCompletion::new("", &["Hi", " there", "!"]),
            true,
            Vec::new(),
        );

        let mut rx = orch.stream_chat("hey", Vec::new()).await.unwrap();

        let mut events = Vec::new();
        while let Some(item) = rx.recv().await {
            events.push(item.unwrap());
        }

        assert_eq!(
            events,
            vec![
                StreamEvent::Fragment("Hi".to_string()),
                StreamEvent::Fragment(" there".to_string()),
                StreamEvent::Fragment("!".to_string()),
                StreamEvent::Done,
            ]
        );
    }
}
