// SPDX-License-Identifier: MIT

//! Per-session SSE recorder (spec.md §4.2 "Recorder", spec.md §7 "Per-session
//! event log"): tees the raw bytes read off an agent's `/event` stream into
//! `<events-dir>/<session-id>.sse`, preserving SSE framing byte-for-byte for
//! forensic replay.

use crate::error::{AdapterError, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

pub struct Recorder {
    temp_path: PathBuf,
    final_path: PathBuf,
    file: Option<File>,
}

impl Recorder {
    /// Opens a temp file in `events_dir`; bytes accumulate there until
    /// `close` renames it over `<session_id>.sse`, so a reader never sees a
    /// partially-written file under the final name.
    pub async fn open(events_dir: &Path, session_id: &str) -> Result<Self> {
        tokio::fs::create_dir_all(events_dir).await?;
        let temp_path = events_dir.join(format!(".{session_id}.sse.tmp"));
        let final_path = events_dir.join(format!("{session_id}.sse"));
        let file = File::create(&temp_path).await?;
        Ok(Self { temp_path, final_path, file: Some(file) })
    }

    /// Appends bytes as-is. Fails with `RecorderClosed` once `close` has
    /// run.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let file = self.file.as_mut().ok_or(AdapterError::RecorderClosed)?;
        file.write_all(bytes).await?;
        Ok(())
    }

    /// Flushes buffered writes without closing the recorder, so in-flight
    /// bytes survive a cancellation that returns before `close` runs.
    pub async fn flush(&mut self) -> Result<()> {
        let file = self.file.as_mut().ok_or(AdapterError::RecorderClosed)?;
        file.flush().await?;
        Ok(())
    }

    /// Flushes, renames the temp file over `<session_id>.sse`, and closes
    /// the recorder. Writes after this fail with `RecorderClosed`.
    pub async fn close(&mut self) -> Result<()> {
        let mut file = self.file.take().ok_or(AdapterError::RecorderClosed)?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&self.temp_path, &self.final_path).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
