// SPDX-License-Identifier: MIT

//! The event envelope broadcast over both the SSE agent transport (§4.2)
//! and the swarm RPC event stream (§4.7), and persisted to the per-repo
//! event log (§3 "Event").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic within a repo's event log; doubles as the SSE `id` field
    /// so subscribers can resume with `Last-Event-ID`.
    pub seq: u64,
    pub kind: String,
    pub entity_id: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    pub fn new(seq: u64, kind: impl Into<String>, entity_id: impl Into<String>, payload: Value, now: DateTime<Utc>) -> Self {
        Self {
            seq,
            kind: kind.into(),
            entity_id: entity_id.into(),
            occurred_at: now,
            payload,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
