// SPDX-License-Identifier: MIT

//! Agent process lifecycle: spawn, readiness polling, and the SSE event
//! bridge that turns an agent's `/event` stream into core `Event`s
//! (spec.md §4.2).

pub mod bridge;
pub mod error;
pub mod process;
pub mod recorder;
pub mod sse;

pub use error::{AdapterError, Result};
pub use process::{spawn, AgentHandle, AgentOutcome, AgentProcessConfig};
pub use recorder::Recorder;
pub use sse::{SseDecoder, SseFrame};
