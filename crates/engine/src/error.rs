// SPDX-License-Identifier: MIT

//! Error kinds shared across the workspace pool, job state machine, and
//! do-all loop (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("'{0}' is ambiguous among: {1}")]
    AmbiguousPrefix(String, String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} is not active")]
    NotActive(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("cancelled")]
    Cancelled,

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("job abandoned: {0}")]
    Abandoned(String),

    #[error("no version-control marker found walking up from {0}")]
    WorkspaceRootNotFound(std::path::PathBuf),

    #[error("{0} is not a known repo or workspace checkout")]
    RepoPathNotFound(std::path::PathBuf),

    #[error("tail subscriber fell behind and was disconnected")]
    Laggard,

    #[error("external command failed (exit {exit_code:?}): {stderr}")]
    External { exit_code: Option<i32>, stderr: String },

    #[error(transparent)]
    Storage(#[from] incrementum_storage::StorageError),

    #[error(transparent)]
    Adapter(#[from] incrementum_adapters::AdapterError),

    #[error(transparent)]
    Shell(#[from] incrementum_shell::ShellError),

    #[error(transparent)]
    Habit(#[from] incrementum_habits::HabitError),

    #[error(transparent)]
    Core(#[from] incrementum_core::Error),
}

impl EngineError {
    pub fn is_abandoned(&self) -> bool {
        matches!(self, EngineError::Abandoned(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
