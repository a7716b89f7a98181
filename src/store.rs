//! Todo record store
//!
//! Records are persisted as JSON documents in an embedded RocksDB database
//! keyed by UUID. The access pattern is list-all plus point lookups, so
//! there are no secondary indices.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rocksdb::{Options, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

fn default_status() -> String {
    "pending".to_string()
}

/// A stored todo record with its precomputed embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub priority: String,
    pub created_at: DateTime<Utc>,
    /// Embedding of `embedding_text()`, empty if generation failed
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Todo {
    pub fn new(
        title: String,
        description: Option<String>,
        status: Option<String>,
        priority: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            status: status.unwrap_or_else(default_status),
            priority,
            created_at: Utc::now(),
            embedding: Vec::new(),
        }
    }

    /// Text the embedding is computed from
    pub fn embedding_text(&self) -> String {
        format!("{} - [{}]", self.title, self.status)
    }

    /// One-line rendering used in the chat context block
    pub fn context_line(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} - {} [{}]", self.title, desc, self.status),
            None => format!("{} [{}]", self.title, self.status),
        }
    }
}

/// Field-merge patch applied by update; absent fields are left untouched
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

impl TodoPatch {
    /// Apply the patch. Returns true when the embedded text (title/status)
    /// changed, meaning the embedding must be recomputed.
    pub fn apply(&self, todo: &mut Todo) -> bool {
        let before = todo.embedding_text();

        if let Some(ref title) = self.title {
            todo.title = title.clone();
        }
        if let Some(ref description) = self.description {
            todo.description = Some(description.clone());
        }
        if let Some(ref status) = self.status {
            todo.status = status.clone();
        }
        if let Some(ref priority) = self.priority {
            todo.priority = priority.clone();
        }

        todo.embedding_text() != before
    }
}

/// Storage engine for todo records
pub struct TodoStore {
    db: Arc<DB>,
}

impl TodoStore {
    /// Open (or create) the store at the given path
    pub fn new(storage_path: &Path) -> Result<Self> {
        let todos_path = storage_path.join("todos");
        std::fs::create_dir_all(&todos_path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = Arc::new(DB::open(&opts, &todos_path).context("Failed to open todos DB")?);

        tracing::info!(path = %todos_path.display(), "Todo store initialized");

        Ok(Self { db })
    }

    /// Persist a todo (insert or overwrite)
    pub fn put(&self, todo: &Todo) -> Result<()> {
        let value = serde_json::to_vec(todo).context("Failed to serialize todo")?;

        self.db
            .put(todo.id.as_bytes(), &value)
            .context("Failed to store todo")?;

        tracing::debug!(todo_id = %todo.id, status = %todo.status, "Stored todo");

        Ok(())
    }

    /// Get a todo by id
    pub fn get(&self, id: &Uuid) -> Result<Option<Todo>> {
        match self.db.get(id.as_bytes())? {
            Some(value) => {
                let todo: Todo =
                    serde_json::from_slice(&value).context("Failed to deserialize todo")?;
                Ok(Some(todo))
            }
            None => Ok(None),
        }
    }

    /// List all todos, oldest first
    pub fn list(&self) -> Result<Vec<Todo>> {
        let mut todos = Vec::new();

        for entry in self.db.iterator(rocksdb::IteratorMode::Start) {
            let (_, value) = entry.context("Failed to read todos DB")?;
            let todo: Todo =
                serde_json::from_slice(&value).context("Failed to deserialize todo")?;
            todos.push(todo);
        }

        todos.sort_by_key(|t| t.created_at);
        Ok(todos)
    }

    /// Delete a todo by id. Deleting an unknown id is not an error.
    pub fn delete(&self, id: &Uuid) -> Result<()> {
        self.db
            .delete(id.as_bytes())
            .context("Failed to delete todo")?;

        tracing::debug!(todo_id = %id, "Deleted todo");

        Ok(())
    }

    /// Flush outstanding writes, for graceful shutdown
    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("Failed to flush todos DB")
    }
}
