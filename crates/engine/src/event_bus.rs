// SPDX-License-Identifier: MIT

//! Event multiplexer (spec.md §4.6): fans one job's event source into the
//! durable per-repo log, the caller's own event channel, and zero or more
//! swarm Tail subscribers registered after the fact.
//!
//! The durable log and the caller's channel apply backpressure (the fan-out
//! task awaits their sends, so a slow caller stalls the job's own event
//! production rather than losing events). Tail subscribers are different:
//! they're best-effort observers a client may attach or detach at any time,
//! so a subscriber that falls behind the high-water mark is disconnected
//! instead of blocking every other subscriber.

use incrementum_core::{Event, RepoSlug};
use incrementum_storage::EventLogWriter;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Tail subscribers beyond this many buffered, undelivered events are
/// dropped as laggards rather than stalling the bus.
pub const TAIL_HIGH_WATER_MARK: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    events_dir: PathBuf,
    tails: Arc<Mutex<HashMap<String, Vec<mpsc::Sender<Event>>>>>,
}

impl EventBus {
    pub fn new(events_dir: PathBuf) -> Self {
        Self { events_dir, tails: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Register a new Tail subscriber for `repo_slug`. Events published for
    /// that repo from this point on are forwarded to the returned receiver
    /// until it falls behind the high-water mark or is dropped.
    pub async fn subscribe(&self, repo_slug: &RepoSlug) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(TAIL_HIGH_WATER_MARK);
        self.tails.lock().await.entry(repo_slug.as_str().to_string()).or_default().push(tx);
        rx
    }

    /// Historical snapshot of every durably logged event for `repo_slug`
    /// (the swarm Logs RPC).
    pub async fn historical(&self, repo_slug: &RepoSlug) -> incrementum_storage::Result<Vec<Event>> {
        incrementum_storage::read_events(&self.events_dir, repo_slug.as_str()).await
    }

    /// Drain `source` until it closes, appending every event to the durable
    /// log, forwarding it to `caller_tx` (if given), and fanning it out to
    /// any live Tail subscribers for `repo_slug`. Returns once `source`
    /// closes; an error from the durable log write ends the run early.
    pub async fn run(&self, repo_slug: &RepoSlug, mut source: mpsc::Receiver<Event>, caller_tx: Option<mpsc::Sender<Event>>) -> incrementum_storage::Result<()> {
        let log = EventLogWriter::open(&self.events_dir, repo_slug.as_str()).await?;

        while let Some(event) = source.recv().await {
            log.append(&event).await?;

            if let Some(tx) = &caller_tx {
                if tx.send(event.clone()).await.is_err() {
                    tracing::debug!(repo_slug = %repo_slug, "caller event stream closed, no longer forwarding");
                }
            }

            self.fan_to_tails(repo_slug, &event).await;
        }

        self.close_tails(repo_slug).await;
        Ok(())
    }

    async fn fan_to_tails(&self, repo_slug: &RepoSlug, event: &Event) {
        let mut tails = self.tails.lock().await;
        let Some(subscribers) = tails.get_mut(repo_slug.as_str()) else {
            return;
        };

        subscribers.retain_mut(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(repo_slug = %repo_slug, "tail subscriber fell behind high-water mark, disconnecting");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    async fn close_tails(&self, repo_slug: &RepoSlug) {
        self.tails.lock().await.remove(repo_slug.as_str());
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
