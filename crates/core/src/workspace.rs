// SPDX-License-Identifier: MIT

//! Workspace record: an isolated checkout of the source repository owned by
//! the orchestrator (spec.md §3 "Workspace").

use crate::repo_slug::RepoSlug;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    Available,
    Acquired,
}

crate::simple_display! {
    WorkspaceStatus {
        Available => "available",
        Acquired => "acquired",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub name: String,
    pub path: PathBuf,
    pub repo_slug: RepoSlug,
    pub status: WorkspaceStatus,
    /// Free-text, single-line reason the workspace is in use. Mandatory on
    /// acquire, cleared on release.
    #[serde(default)]
    pub purpose: String,
    pub revision: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquired_at: Option<DateTime<Utc>>,
}

impl Workspace {
    pub fn new(name: impl Into<String>, path: PathBuf, repo_slug: RepoSlug, revision: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            path,
            repo_slug,
            status: WorkspaceStatus::Available,
            purpose: String::new(),
            revision: revision.into(),
            created_at: now,
            updated_at: now,
            acquired_at: None,
        }
    }

    pub fn acquire(&mut self, purpose: String, now: DateTime<Utc>) {
        self.status = WorkspaceStatus::Acquired;
        self.purpose = purpose;
        self.acquired_at = Some(now);
        self.updated_at = now;
    }

    pub fn release(&mut self, now: DateTime<Utc>) {
        self.status = WorkspaceStatus::Available;
        self.purpose.clear();
        self.acquired_at = None;
        self.updated_at = now;
    }
}

crate::builder! {
    pub struct WorkspaceBuilder => Workspace {
        into {
            name: String = "ws-1",
            path: PathBuf = "/tmp/ws-1",
            revision: String = "@",
            purpose: String = "",
        }
        set {
            repo_slug: RepoSlug = RepoSlug("repo-00000000".to_string()),
            status: WorkspaceStatus = WorkspaceStatus::Available,
        }
        option {
            acquired_at: DateTime<Utc> = None,
        }
        computed {
            created_at: DateTime<Utc> = Utc::now(),
            updated_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
