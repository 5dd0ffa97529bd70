// SPDX-License-Identifier: MIT

//! The state store: a single JSON file guarded by an advisory lock file,
//! mutated via lock -> read -> transform -> write-temp -> rename -> unlock
//! (spec.md §4.1).

use crate::error::{Result, StorageError};
use crate::state::StateFile;
use fs4::tokio::AsyncFileExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

pub struct StateStore {
    state_path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl StateStore {
    /// `dir` holds `state.json` and `state.lock`; created if missing.
    pub async fn open(dir: &Path, lock_timeout: Duration) -> Result<Self> {
        fs::create_dir_all(dir).await?;
        Ok(Self {
            state_path: dir.join("state.json"),
            lock_path: dir.join("state.lock"),
            lock_timeout,
        })
    }

    /// Read the current state without taking the write lock. Callers that
    /// need a consistent read-modify-write must use [`Self::mutate`]
    /// instead — this is for cheap, tolerant-of-staleness reads (status
    /// queries, `swarm list`).
    pub async fn read(&self) -> Result<StateFile> {
        self.read_state_file().await
    }

    /// Acquire the exclusive lock, read the state, let `f` transform it in
    /// place, then durably persist the result before releasing the lock.
    /// `f`'s return value is passed back to the caller.
    pub async fn mutate<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StateFile) -> T + Send + 'static,
        T: Send + 'static,
    {
        let lock_file = self.acquire_lock().await?;

        let mut state = self.read_state_file().await?;
        let result = f(&mut state);
        self.write_state_file(&state).await?;

        drop(lock_file);
        Ok(result)
    }

    /// Mint the deterministic slug for `repo_root` and durably record the
    /// repo-root it was minted from, so the mapping survives even if the
    /// repo is later moved or deleted.
    pub async fn get_or_create_repo_slug(&self, repo_root: &Path) -> Result<incrementum_core::RepoSlug> {
        let repo_root = repo_root.to_path_buf();
        self.mutate(move |state| state.get_or_create_repo_slug(&repo_root)).await
    }

    async fn acquire_lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .await?;

        let deadline = tokio::time::Instant::now() + self.lock_timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(file),
                Err(_) if tokio::time::Instant::now() < deadline => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                Err(_) => return Err(StorageError::LockTimeout(self.lock_timeout)),
            }
        }
    }

    async fn read_state_file(&self) -> Result<StateFile> {
        let contents = match fs::read(&self.state_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StateFile::default()),
            Err(e) => return Err(e.into()),
        };
        if contents.is_empty() {
            return Ok(StateFile::default());
        }
        serde_json::from_slice(&contents).map_err(|source| StorageError::Corrupt {
            path: self.state_path.clone(),
            source,
        })
    }

    async fn write_state_file(&self, state: &StateFile) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(state).map_err(|source| StorageError::Corrupt {
            path: self.state_path.clone(),
            source,
        })?;

        let tmp_path = self.state_path.with_extension("json.tmp");
        let mut tmp = File::create(&tmp_path).await?;
        tmp.write_all(&serialized).await?;
        tmp.sync_all().await?;
        drop(tmp);

        fs::rename(&tmp_path, &self.state_path).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
