// SPDX-License-Identifier: MIT

//! Agent session registry (spec.md §4.3): create/find/complete/kill/list
//! operations layered over the state store's `sessions` map.

use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use incrementum_core::{AgentSession, RepoSlug, SessionStatus};
use incrementum_storage::StateStore;
use serde_json::Value;
use std::sync::Arc;

pub struct SessionRegistry {
    store: Arc<StateStore>,
    vcs_shell_binary: String,
}

impl SessionRegistry {
    pub fn new(store: Arc<StateStore>, agent_binary: impl Into<String>) -> Self {
        Self { store, vcs_shell_binary: agent_binary.into() }
    }

    pub async fn create_session(&self, repo_slug: RepoSlug, agent_session_id: String, prompt: String, started_at: DateTime<Utc>) -> Result<AgentSession> {
        let key = repo_slug.key(&agent_session_id);
        self.store
            .mutate(move |state| {
                if state.sessions.contains_key(&key) {
                    return Err(EngineError::AlreadyExists(key.clone()));
                }
                let session = AgentSession::new(agent_session_id, repo_slug, prompt, started_at);
                state.sessions.insert(key, session.clone());
                Ok(session)
            })
            .await?
    }

    pub async fn find_session(&self, repo_slug: &RepoSlug, id_or_prefix: &str) -> Result<AgentSession> {
        let state = self.store.read().await?;
        find_in_repo(&state.sessions, repo_slug, id_or_prefix)
    }

    /// Transition `id` from `active` to `status`, filling `duration_seconds`
    /// from `completed_at - started_at` unless the caller supplies a
    /// non-zero override.
    pub async fn complete_session(
        &self,
        repo_slug: RepoSlug,
        id: String,
        status: SessionStatus,
        completed_at: DateTime<Utc>,
        exit_code: Option<i32>,
        duration_seconds: Option<u64>,
    ) -> Result<AgentSession> {
        let key = repo_slug.key(&id);
        self.store
            .mutate(move |state| {
                let session = state.sessions.get_mut(&key).ok_or_else(|| EngineError::NotFound(key.clone()))?;
                if session.status.is_terminal() {
                    return Err(EngineError::NotActive(key.clone()));
                }
                session.finish(status, exit_code, completed_at);
                if let Some(d) = duration_seconds.filter(|d| *d != 0) {
                    session.duration_seconds = Some(d);
                }
                Ok(session.clone())
            })
            .await?
    }

    /// Invoke the agent's kill command for `id`, then complete the session
    /// as `killed`. Already-terminal sessions return the stored record
    /// without error (idempotent).
    pub async fn kill(&self, repo_slug: RepoSlug, id: String) -> Result<AgentSession> {
        let existing = self.find_session(&repo_slug, &id).await?;
        if existing.status.is_terminal() {
            return Ok(existing);
        }

        let command = format!("{} session kill {} --format json", self.vcs_shell_binary, shell_quote(&id));
        let output = incrementum_shell::run(&command, std::env::temp_dir().as_path(), &[]).await?;
        let (exit_code, duration_seconds) = parse_kill_envelope(&output.stdout);

        match self.complete_session(repo_slug, id, SessionStatus::Killed, Utc::now(), exit_code, duration_seconds).await {
            Ok(session) => Ok(session),
            Err(EngineError::NotActive(_)) => self.find_session(&existing.repo_slug, &existing.id).await,
            Err(e) => Err(e),
        }
    }

    pub async fn list_sessions(&self, repo_slug: &RepoSlug) -> Result<Vec<AgentSession>> {
        let state = self.store.read().await?;
        let mut sessions: Vec<AgentSession> = state
            .sessions
            .values()
            .filter(|s| &s.repo_slug == repo_slug)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        Ok(sessions)
    }
}

fn find_in_repo(sessions: &std::collections::HashMap<String, AgentSession>, repo_slug: &RepoSlug, id_or_prefix: &str) -> Result<AgentSession> {
    let needle = id_or_prefix.to_lowercase();
    let mut matches = sessions.values().filter(|s| &s.repo_slug == repo_slug && s.id.to_lowercase().starts_with(&needle));

    let first = matches.next().cloned().ok_or_else(|| EngineError::NotFound(id_or_prefix.to_string()))?;
    if matches.next().is_some() {
        return Err(EngineError::AmbiguousPrefix(id_or_prefix.to_string(), first.id.clone()));
    }
    Ok(first)
}

/// The agent's `session kill` JSON envelope may be a flat object, a
/// `{session: {...}}` wrapper, or a single-element list of either.
fn parse_kill_envelope(stdout: &str) -> (Option<i32>, Option<u64>) {
    let Ok(value) = serde_json::from_str::<Value>(stdout.trim()) else {
        return (None, None);
    };
    let object = match &value {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    let Some(object) = object else {
        return (None, None);
    };
    let object = object.get("session").unwrap_or(object);

    let exit_code = object.get("exit_code").and_then(Value::as_i64).map(|v| v as i32);
    let duration_seconds = object.get("duration_seconds").and_then(Value::as_u64);
    (exit_code, duration_seconds)
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
#[path = "session_registry_tests.rs"]
mod tests;
