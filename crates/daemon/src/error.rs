// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Protocol(#[from] crate::protocol::ProtocolError),
    #[error(transparent)]
    Engine(#[from] incrementum_engine::EngineError),
    #[error(transparent)]
    Storage(#[from] incrementum_storage::StorageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Rpc(#[from] crate::protocol::RpcError),
}

pub type Result<T> = std::result::Result<T, DaemonError>;
