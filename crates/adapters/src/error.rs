// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to spawn agent process: {0}")]
    SpawnFailed(String),

    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("agent did not become ready within {0:?}")]
    NotReady(std::time::Duration),

    #[error("recorder closed")]
    RecorderClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
