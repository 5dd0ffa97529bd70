// SPDX-License-Identifier: MIT

use super::*;
use chrono::Utc;

#[test]
fn new_session_starts_active() {
    let s = AgentSession::new(
        "agent-1".into(),
        RepoSlug("repo-deadbeef".into()),
        "implement foo".into(),
        Utc::now(),
    );
    assert_eq!(s.status, SessionStatus::Active);
    assert!(s.completed_at.is_none());
    assert!(s.exit_code.is_none());
}

#[test]
fn finish_records_duration_and_exit_code() {
    let start = Utc::now();
    let mut s = AgentSession::new("agent-1".into(), RepoSlug("repo-deadbeef".into()), "p".into(), start);
    let end = start + chrono::Duration::seconds(42);
    s.finish(SessionStatus::Completed, Some(0), end);
    assert_eq!(s.status, SessionStatus::Completed);
    assert_eq!(s.exit_code, Some(0));
    assert_eq!(s.duration_seconds, Some(42));
    assert_eq!(s.completed_at, Some(end));
}

#[test]
fn is_terminal_distinguishes_active() {
    assert!(!SessionStatus::Active.is_terminal());
    assert!(SessionStatus::Completed.is_terminal());
    assert!(SessionStatus::Failed.is_terminal());
    assert!(SessionStatus::Killed.is_terminal());
}
