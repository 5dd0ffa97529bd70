// SPDX-License-Identifier: MIT

//! The on-disk state document: a single JSON object keyed by
//! `<repo-slug>/<entity-id>` per entity kind (spec.md §3, §4.1).

use incrementum_core::{AgentSession, Job, Workspace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// The full materialized state, read from and written back to the state
/// file on every mutation. Unlike the event-sourced approach this is not
/// rebuilt from a log — it IS the durable record.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub jobs: HashMap<String, Job>,
    #[serde(default)]
    pub sessions: HashMap<String, AgentSession>,
    #[serde(default)]
    pub workspaces: HashMap<String, Workspace>,
    /// Per-repo monotonic event sequence counter, so appends to the event
    /// log never reuse a `seq` even across process restarts.
    #[serde(default)]
    pub event_seq: HashMap<String, u64>,
    /// repo-slug -> bound swarm RPC port, recorded on first bind (§4.7).
    #[serde(default)]
    pub swarm_ports: HashMap<String, u16>,
    /// repo-slug -> canonical repo root, minted once per absolute path and
    /// immutable thereafter (`GetOrCreateRepoSlug`, spec.md §3 "RepoSlug").
    #[serde(default)]
    pub repo_names: HashMap<String, PathBuf>,
    /// Schema version, bumped on breaking on-disk format changes.
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
}

fn current_schema_version() -> u32 {
    1
}

impl StateFile {
    pub fn next_event_seq(&mut self, repo_slug: &str) -> u64 {
        let counter = self.event_seq.entry(repo_slug.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Mint (or return the existing) deterministic slug for `repo_root`,
    /// recording the mapping so it survives even if the repo later becomes
    /// unreachable at that path.
    pub fn get_or_create_repo_slug(&mut self, repo_root: &std::path::Path) -> incrementum_core::RepoSlug {
        let slug = incrementum_core::sanitize_repo_name(repo_root);
        self.repo_names.entry(slug.as_str().to_string()).or_insert_with(|| repo_root.to_path_buf());
        slug
    }

    pub fn repo_root_for_slug(&self, slug: &str) -> Option<&PathBuf> {
        self.repo_names.get(slug)
    }

    /// Find a job whose id equals `id_or_prefix` or, failing that, whose id
    /// starts with it uniquely (git-style short-id lookup).
    pub fn find_job(&self, id_or_prefix: &str) -> Option<&Job> {
        find_by_prefix(&self.jobs, id_or_prefix)
    }

    pub fn find_session(&self, id_or_prefix: &str) -> Option<&AgentSession> {
        find_by_prefix(&self.sessions, id_or_prefix)
    }
}

/// Look up by exact key first, then by unique prefix match. Returns `None`
/// if the prefix is ambiguous (matches more than one entry).
fn find_by_prefix<'a, V>(map: &'a HashMap<String, V>, id_or_prefix: &str) -> Option<&'a V> {
    if let Some(v) = map.get(id_or_prefix) {
        return Some(v);
    }
    let mut matches = map.iter().filter(|(k, _)| k.ends_with(id_or_prefix) || k.contains(id_or_prefix));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first.1)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
