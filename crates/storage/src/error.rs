// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to acquire state lock within {0:?}")]
    LockTimeout(std::time::Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("corrupt state file at {path}: {source}")]
    Corrupt { path: std::path::PathBuf, source: serde_json::Error },

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StorageError>;
