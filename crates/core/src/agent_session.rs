// SPDX-License-Identifier: MIT

//! An agent process invocation: one spawn of the coding agent against a
//! workspace, carrying the prompt it was given and its terminal outcome
//! (spec.md §3 "AgentSession", §4.2).

use crate::repo_slug::RepoSlug;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
    Killed,
}

crate::simple_display! {
    SessionStatus {
        Active => "active",
        Completed => "completed",
        Failed => "failed",
        Killed => "killed",
    }
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    /// ID assigned by the agent process itself over its control channel,
    /// not generated by the orchestrator.
    pub id: String,
    pub repo_slug: RepoSlug,
    pub prompt: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl AgentSession {
    pub fn new(id: String, repo_slug: RepoSlug, prompt: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            repo_slug,
            prompt,
            status: SessionStatus::Active,
            started_at: now,
            updated_at: now,
            completed_at: None,
            duration_seconds: None,
            exit_code: None,
        }
    }

    pub fn finish(&mut self, status: SessionStatus, exit_code: Option<i32>, now: DateTime<Utc>) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.exit_code = exit_code;
        self.completed_at = Some(now);
        self.duration_seconds = Some((now - self.started_at).num_seconds().max(0) as u64);
        self.updated_at = now;
    }
}

crate::builder! {
    pub struct AgentSessionBuilder => AgentSession {
        into {
            id: String = "agent-1",
            prompt: String = "implement the thing",
        }
        set {
            repo_slug: RepoSlug = RepoSlug("repo-00000000".to_string()),
            status: SessionStatus = SessionStatus::Active,
            completed_at: Option<DateTime<Utc>> = None,
            duration_seconds: Option<u64> = None,
            exit_code: Option<i32> = None,
        }
        computed {
            started_at: DateTime<Utc> = Utc::now(),
            updated_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "agent_session_tests.rs"]
mod tests;
