// SPDX-License-Identifier: MIT

//! Durable per-repo event log (spec.md §4.6/§4.7): one newline-delimited
//! JSON file per repo slug under the configured events directory. Appends
//! are the only write operation; Logs reads the whole file back.

use crate::error::{Result, StorageError};
use incrementum_core::Event;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

pub struct EventLogWriter {
    path: PathBuf,
}

impl EventLogWriter {
    /// Open (creating if absent) the log file for `repo_slug` under
    /// `events_dir`.
    pub async fn open(events_dir: &Path, repo_slug: &str) -> Result<Self> {
        fs::create_dir_all(events_dir).await?;
        Ok(Self { path: events_dir.join(format!("{repo_slug}.events.jsonl")) })
    }

    /// Append one event as a JSON line, fsync'd before return so a crash
    /// immediately after never loses an acknowledged event.
    pub async fn append(&self, event: &Event) -> Result<()> {
        let mut line = serde_json::to_vec(event).map_err(|source| StorageError::Corrupt { path: self.path.clone(), source })?;
        line.push(b'\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(&line).await?;
        file.sync_all().await?;
        Ok(())
    }
}

/// Read every well-formed event in `repo_slug`'s log, in append order. A
/// truncated trailing line (a crash mid-append) is skipped rather than
/// failing the whole read.
pub async fn read_events(events_dir: &Path, repo_slug: &str) -> Result<Vec<Event>> {
    let path = events_dir.join(format!("{repo_slug}.events.jsonl"));
    let contents = match fs::read_to_string(&path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut events = Vec::new();
    let mut lines = contents.lines().peekable();
    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(line) {
            Ok(event) => events.push(event),
            Err(_) if lines.peek().is_none() => break,
            Err(source) => return Err(StorageError::Corrupt { path, source }),
        }
    }
    Ok(events)
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
