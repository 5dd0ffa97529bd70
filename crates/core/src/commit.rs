// SPDX-License-Identifier: MIT

//! A committed revision recorded against a job, produced at the end of the
//! committing stage (spec.md §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub revision: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl CommitRecord {
    pub fn new(revision: impl Into<String>, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            revision: revision.into(),
            message: message.into(),
            created_at: now,
        }
    }
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
