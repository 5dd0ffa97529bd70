// SPDX-License-Identifier: MIT

//! Acquire/release/list/destroy of per-repo workspace checkouts
//! (spec.md §4.4).
//!
//! Acquisition is split into a synchronous reservation (inside a single
//! `StateStore::mutate`, so two concurrent callers never pick the same
//! workspace) followed, only when a new workspace must be created, by the
//! VCS `workspace add` call running outside the lock. If that call fails
//! the reservation is rolled back in a second `mutate`.

use crate::error::{EngineError, Result};
use chrono::Utc;
use incrementum_core::{sanitize_repo_name, RepoSlug, Workspace, WorkspaceStatus};
use incrementum_storage::StateStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct WorkspacePool {
    store: Arc<StateStore>,
    vcs_binary: String,
    workspaces_root: PathBuf,
}

enum Reservation {
    Existing(Workspace),
    New { key: String, workspace: Workspace },
}

impl WorkspacePool {
    pub fn new(store: Arc<StateStore>, vcs_binary: impl Into<String>, workspaces_root: PathBuf) -> Self {
        Self { store, vcs_binary: vcs_binary.into(), workspaces_root }
    }

    pub async fn acquire(&self, repo_root: &Path, rev: &str, purpose: String) -> Result<Workspace> {
        validate_purpose(&purpose)?;
        let repo_slug = sanitize_repo_name(repo_root);
        let now = Utc::now();

        let reservation = {
            let repo_slug = repo_slug.clone();
            let purpose = purpose.clone();
            let workspaces_root = self.workspaces_root.clone();
            let repo_root = repo_root.to_path_buf();
            self.store
                .mutate(move |state| {
                    state.get_or_create_repo_slug(&repo_root);
                    reserve(state, &repo_slug, &purpose, &workspaces_root, now)
                })
                .await?
        };

        match reservation {
            Reservation::Existing(ws) => Ok(ws),
            Reservation::New { key, workspace } => {
                if let Err(e) = self.create_on_disk(repo_root, &workspace.path, rev).await {
                    self.store.mutate(move |state| { state.workspaces.remove(&key); }).await?;
                    return Err(e);
                }
                Ok(workspace)
            }
        }
    }

    async fn create_on_disk(&self, repo_root: &Path, workspace_path: &Path, rev: &str) -> Result<()> {
        let command = format!(
            "{} workspace add {} -r {}",
            self.vcs_binary,
            shell_quote(&workspace_path.to_string_lossy()),
            shell_quote(rev)
        );
        let output = incrementum_shell::run(&command, repo_root, &[]).await?;
        if !output.success() {
            return Err(EngineError::External { exit_code: Some(output.exit_code), stderr: output.stderr.trim().to_string() });
        }
        Ok(())
    }

    pub async fn release(&self, repo_root: &Path, name: &str) -> Result<()> {
        let repo_slug = sanitize_repo_name(repo_root);
        let key = repo_slug.key(name);
        let now = Utc::now();
        self.store
            .mutate(move |state| {
                if let Some(ws) = state.workspaces.get_mut(&key) {
                    if ws.status == WorkspaceStatus::Acquired {
                        ws.release(now);
                    } else {
                        tracing::info!(workspace = %key, "release: already available, no-op");
                    }
                } else {
                    tracing::warn!(workspace = %key, "release: no such workspace, no-op");
                }
            })
            .await?;
        Ok(())
    }

    pub async fn list(&self, repo_root: &Path) -> Result<Vec<Workspace>> {
        let repo_slug = sanitize_repo_name(repo_root);
        let state = self.store.read().await?;
        let mut workspaces: Vec<Workspace> =
            state.workspaces.values().filter(|w| w.repo_slug == repo_slug).cloned().collect();
        workspaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(workspaces)
    }

    pub async fn destroy_all(&self, repo_root: &Path) -> Result<()> {
        let repo_slug = sanitize_repo_name(repo_root);
        let workspaces = self.list(repo_root).await?;
        let mut survivors = Vec::new();

        for ws in &workspaces {
            let forget = format!("{} workspace forget {}", self.vcs_binary, shell_quote(&ws.name));
            let _ = incrementum_shell::run(&forget, repo_root, &[]).await;
            if let Err(e) = tokio::fs::remove_dir_all(&ws.path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    survivors.push(ws.name.clone());
                }
            }
        }

        self.store
            .mutate(move |state| {
                state.workspaces.retain(|_, w| w.repo_slug != repo_slug);
            })
            .await?;

        if survivors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::External { exit_code: None, stderr: format!("survivors: {}", survivors.join(", ")) })
        }
    }

    /// Walk up from `path` to the nearest VCS marker directory, then resolve
    /// that marker root to the canonical *source* repo root — a path inside
    /// a workspace checkout resolves to the repo it was checked out from,
    /// not the checkout itself.
    pub async fn repo_root_from_path(&self, path: &Path) -> Result<PathBuf> {
        let marker_root = find_vcs_marker_root(path).ok_or_else(|| EngineError::WorkspaceRootNotFound(path.to_path_buf()))?;

        let state = self.store.read().await?;

        if state.repo_names.values().any(|root| root == &marker_root) {
            return Ok(marker_root);
        }

        let owning_workspace = state.workspaces.values().find(|w| w.path == marker_root);
        if let Some(ws) = owning_workspace {
            if let Some(root) = state.repo_root_for_slug(ws.repo_slug.as_str()) {
                return Ok(root.clone());
            }
        }

        Err(EngineError::RepoPathNotFound(path.to_path_buf()))
    }

    /// Given a path inside a workspace checkout, return the workspace's
    /// recorded name.
    pub async fn workspace_name_for_path(&self, path: &Path) -> Result<String> {
        let state = self.store.read().await?;
        state
            .workspaces
            .values()
            .find(|w| path.starts_with(&w.path))
            .map(|w| w.name.clone())
            .ok_or_else(|| EngineError::RepoPathNotFound(path.to_path_buf()))
    }
}

/// Walk up from `path` (inclusive) looking for a directory containing a
/// `.jj` marker, as `jj workspace add`/`jj init` create.
fn find_vcs_marker_root(path: &Path) -> Option<PathBuf> {
    let mut current = Some(path);
    while let Some(dir) = current {
        if dir.join(".jj").is_dir() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn reserve(state: &mut incrementum_storage::StateFile, repo_slug: &RepoSlug, purpose: &str, workspaces_root: &Path, now: chrono::DateTime<Utc>) -> Reservation {
    let mut candidates: Vec<String> = state
        .workspaces
        .iter()
        .filter(|(_, w)| &w.repo_slug == repo_slug && w.status == WorkspaceStatus::Available)
        .map(|(k, _)| k.clone())
        .collect();
    candidates.sort();

    if let Some(key) = candidates.into_iter().next() {
        if let Some(ws) = state.workspaces.get_mut(&key) {
            ws.acquire(purpose.to_string(), now);
            return Reservation::Existing(ws.clone());
        }
    }

    let existing = state.workspaces.values().filter(|w| &w.repo_slug == repo_slug).count();
    let name = format!("{}-{}", repo_slug.as_str(), existing + 1);
    let path = workspaces_root.join(&name);
    let mut workspace = Workspace::new(name, path, repo_slug.clone(), "@", now);
    workspace.acquire(purpose.to_string(), now);

    let key = repo_slug.key(&workspace.name);
    state.workspaces.insert(key.clone(), workspace.clone());
    Reservation::New { key, workspace }
}

fn validate_purpose(purpose: &str) -> Result<()> {
    if purpose.is_empty() {
        return Err(EngineError::Validation("purpose is required".to_string()));
    }
    if purpose.contains('\n') {
        return Err(EngineError::Validation("purpose must be a single line".to_string()));
    }
    Ok(())
}

/// Single-quote a value for embedding in a shell command line run via
/// `incrementum_shell`, escaping embedded single quotes POSIX-style.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
#[path = "workspace_pool_tests.rs"]
mod tests;
