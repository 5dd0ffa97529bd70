// SPDX-License-Identifier: MIT

//! The todo store is an external collaborator (spec.md §1); this crate
//! defines only the interface the do-all loop and job state machine
//! consume from it, not a concrete file format.

use crate::error::{EngineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const VALID_PRIORITY_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Recognised non-interactive todo types. "interactive" (a design todo) is
/// recognised too, but is never returned by `next_ready` and never passes
/// filter validation as a requested type.
pub const KNOWN_NON_INTERACTIVE_TYPES: &[&str] = &["feature", "bug", "chore", "refactor"];
pub const INTERACTIVE_TYPE: &str = "interactive";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Open,
    Proposed,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub todo_type: String,
    pub priority: u8,
    pub status: TodoStatus,
}

/// Optional narrowing applied by the do-all loop when selecting the next
/// ready todo.
#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    pub max_priority: Option<u8>,
    pub types: Option<Vec<String>>,
}

impl TodoFilter {
    pub fn validate(&self) -> Result<()> {
        if let Some(p) = self.max_priority {
            if !VALID_PRIORITY_RANGE.contains(&p) {
                return Err(EngineError::Validation(format!(
                    "priority {p} out of range {}..={}",
                    VALID_PRIORITY_RANGE.start(),
                    VALID_PRIORITY_RANGE.end()
                )));
            }
        }
        if let Some(types) = &self.types {
            for t in types {
                if t == INTERACTIVE_TYPE {
                    return Err(EngineError::Validation("design todos are never selected".to_string()));
                }
                if !KNOWN_NON_INTERACTIVE_TYPES.contains(&t.as_str()) {
                    return Err(EngineError::Validation(format!("unknown todo type: {t}")));
                }
            }
        }
        Ok(())
    }

    /// Whether `todo` satisfies this filter; `interactive` todos never do,
    /// regardless of whether `types` was even specified.
    pub fn matches(&self, todo: &Todo) -> bool {
        if todo.status != TodoStatus::Open {
            return false;
        }
        if todo.todo_type == INTERACTIVE_TYPE {
            return false;
        }
        if let Some(ceiling) = self.max_priority {
            if todo.priority > ceiling {
                return false;
            }
        }
        if let Some(types) = &self.types {
            if !types.iter().any(|t| t == &todo.todo_type) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait TodoSource: Send + Sync {
    async fn list(&self) -> Result<Vec<Todo>>;

    /// The next ready todo under `filter`, or `None` if the store is empty
    /// of matching work. Selection among ties is implementation-defined;
    /// the in-memory test-support store picks the lowest priority number
    /// first, then insertion order.
    async fn next_ready(&self, filter: &TodoFilter) -> Result<Option<Todo>>;

    async fn mark_status(&self, id: &str, status: TodoStatus) -> Result<()>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod memory {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryTodoSource {
        todos: Mutex<Vec<Todo>>,
    }

    impl InMemoryTodoSource {
        pub fn new(todos: Vec<Todo>) -> Self {
            Self { todos: Mutex::new(todos) }
        }
    }

    #[async_trait]
    impl TodoSource for InMemoryTodoSource {
        async fn list(&self) -> Result<Vec<Todo>> {
            Ok(self.todos.lock().await.clone())
        }

        async fn next_ready(&self, filter: &TodoFilter) -> Result<Option<Todo>> {
            filter.validate()?;
            let todos = self.todos.lock().await;
            Ok(todos
                .iter()
                .filter(|t| filter.matches(t))
                .min_by_key(|t| t.priority)
                .cloned())
        }

        async fn mark_status(&self, id: &str, status: TodoStatus) -> Result<()> {
            let mut todos = self.todos.lock().await;
            let todo = todos.iter_mut().find(|t| t.id == id).ok_or_else(|| EngineError::NotFound(id.to_string()))?;
            todo.status = status;
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "todo_source_tests.rs"]
mod tests;
