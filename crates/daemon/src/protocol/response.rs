// SPDX-License-Identifier: MIT

//! Response envelope and the push-stream frames Tail uses (spec.md §6).

use incrementum_core::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn ok(id: impl Into<String>, result: Value) -> Self {
        Self { id: id.into(), result: Some(result), error: None }
    }

    pub fn err(id: impl Into<String>, error: RpcError) -> Self {
        Self { id: id.into(), result: None, error: Some(error) }
    }
}

/// RPC-level failures (spec.md §4.7's per-method error column); distinct
/// from [`crate::protocol::ProtocolError`], which is wire framing and
/// decoding failure rather than a method outcome.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind")]
pub enum RpcError {
    #[error("todo {todo_id} not found")]
    TodoNotFound { todo_id: String },
    #[error("workspace unavailable: {reason}")]
    WorkspaceUnavailable { reason: String },
    #[error("job {job_id} not found")]
    JobNotFound { job_id: String },
    #[error("job {job_id} is not active")]
    JobNotActive { job_id: String },
    #[error("tail subscriber fell behind and was disconnected")]
    Laggard,
    #[error("{message}")]
    Internal { message: String },
}

/// One frame of a Tail stream: either a forwarded event or the terminal
/// marker sent once the source closes (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailFrame {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl TailFrame {
    pub fn event(id: impl Into<String>, event: Event) -> Self {
        Self { id: id.into(), event: Some(event), done: None }
    }

    pub fn done(id: impl Into<String>) -> Self {
        Self { id: id.into(), event: None, done: Some(true) }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
