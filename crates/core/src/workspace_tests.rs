// SPDX-License-Identifier: MIT

use super::*;
use chrono::Utc;

#[test]
fn new_workspace_is_available() {
    let ws = Workspace::new("ws-1", "/tmp/ws-1".into(), RepoSlug("repo-deadbeef".into()), "@", Utc::now());
    assert_eq!(ws.status, WorkspaceStatus::Available);
    assert!(ws.purpose.is_empty());
    assert!(ws.acquired_at.is_none());
}

#[test]
fn acquire_then_release_round_trips() {
    let mut ws = Workspace::builder().build();
    let t1 = Utc::now();
    ws.acquire("implement job-1".to_string(), t1);
    assert_eq!(ws.status, WorkspaceStatus::Acquired);
    assert_eq!(ws.purpose, "implement job-1");
    assert_eq!(ws.acquired_at, Some(t1));

    let t2 = Utc::now();
    ws.release(t2);
    assert_eq!(ws.status, WorkspaceStatus::Available);
    assert!(ws.purpose.is_empty());
    assert!(ws.acquired_at.is_none());
    assert_eq!(ws.updated_at, t2);
}
