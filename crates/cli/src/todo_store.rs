// SPDX-License-Identifier: MIT

//! A minimal on-disk `TodoSource` (spec.md §1 describes the todo store as
//! an external collaborator; this is the CLI's own default so `swarm
//! serve`/`swarm do` are runnable without a separate process supplying
//! one). Holds the whole list in memory, persisting to a single JSON
//! array file on every mutation.

use async_trait::async_trait;
use incrementum_engine::{EngineError, Todo, TodoFilter, TodoSource, TodoStatus};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct JsonTodoSource {
    path: PathBuf,
    todos: Mutex<Vec<Todo>>,
}

impl JsonTodoSource {
    /// Loads `<repo_root>/.incrementum/todos.json`, treating a missing file
    /// as an empty list.
    pub fn open(repo_root: &Path) -> incrementum_engine::Result<Self> {
        let path = repo_root.join(".incrementum").join("todos.json");
        let todos = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| EngineError::Validation(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(EngineError::Validation(format!("{}: {e}", path.display()))),
        };
        Ok(Self { path, todos: Mutex::new(todos) })
    }

    async fn persist(&self, todos: &[Todo]) -> incrementum_engine::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| EngineError::Validation(e.to_string()))?;
        }
        let serialized = serde_json::to_vec_pretty(todos).map_err(|e| EngineError::Validation(e.to_string()))?;
        tokio::fs::write(&self.path, serialized).await.map_err(|e| EngineError::Validation(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TodoSource for JsonTodoSource {
    async fn list(&self) -> incrementum_engine::Result<Vec<Todo>> {
        Ok(self.todos.lock().await.clone())
    }

    async fn next_ready(&self, filter: &TodoFilter) -> incrementum_engine::Result<Option<Todo>> {
        filter.validate()?;
        let todos = self.todos.lock().await;
        Ok(todos.iter().filter(|t| filter.matches(t)).min_by_key(|t| t.priority).cloned())
    }

    async fn mark_status(&self, id: &str, status: TodoStatus) -> incrementum_engine::Result<()> {
        let mut todos = self.todos.lock().await;
        let todo = todos.iter_mut().find(|t| t.id == id).ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        todo.status = status;
        self.persist(&todos).await
    }
}

#[cfg(test)]
#[path = "todo_store_tests.rs"]
mod tests;
