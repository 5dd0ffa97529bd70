// SPDX-License-Identifier: MIT

//! A deterministic, filesystem-safe shortening of a repo's absolute path.
//!
//! Used as the primary key prefix for every per-repo record in the state
//! file (`<repo-slug>/<entity-id>`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoSlug(pub String);

impl RepoSlug {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the composite state-file key `<repo-slug>/<entity-id>`.
    pub fn key(&self, entity_id: &str) -> String {
        format!("{}/{}", self.0, entity_id)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RepoSlug {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for RepoSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Deterministically shorten an absolute repo path into a filesystem-safe
/// slug: the final path component, lowercased, with non-alphanumeric runs
/// collapsed to `-`, suffixed with an 8-hex-digit FNV-1a hash of the full
/// path so distinct repos sharing a basename never collide.
pub fn sanitize_repo_name(path: &Path) -> RepoSlug {
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("repo")
        .to_lowercase();

    let mut slug = String::with_capacity(base.len());
    let mut last_was_dash = false;
    for ch in base.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "repo" } else { slug };

    let hash = fnv1a(path.to_string_lossy().as_bytes());
    RepoSlug(format!("{slug}-{hash:08x}"))
}

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
#[path = "repo_slug_tests.rs"]
mod tests;
