// SPDX-License-Identifier: MIT

use super::*;
use chrono::Utc;

#[test]
fn new_job_starts_implementing_with_one_visit() {
    let job = Job::new(RepoSlug("repo-deadbeef".into()), "todo-1", None, Utc::now());
    assert_eq!(job.stage, Stage::Implementing);
    assert_eq!(job.status, JobStatus::Active);
    assert_eq!(job.stage_visits.get(&Stage::Implementing), Some(&1));
    assert_eq!(job.stage_history.len(), 1);
}

#[test]
fn enter_stage_appends_history_and_counts_visits() {
    let mut job = Job::new(RepoSlug("repo-deadbeef".into()), "todo-1", None, Utc::now());
    let over = job.enter_stage(Stage::Testing, Utc::now(), DEFAULT_MAX_STAGE_VISITS);
    assert!(!over);
    assert_eq!(job.test_attempts, 1);
    assert_eq!(job.stage_history.len(), 2);
    assert_eq!(job.stage_visits.get(&Stage::Testing), Some(&1));
}

#[test]
fn enter_stage_signals_when_visits_exceed_max() {
    let mut job = Job::new(RepoSlug("repo-deadbeef".into()), "todo-1", None, Utc::now());
    let max = 2;
    assert!(!job.enter_stage(Stage::Testing, Utc::now(), max));
    assert!(!job.enter_stage(Stage::Implementing, Utc::now(), max));
    assert!(!job.enter_stage(Stage::Testing, Utc::now(), max));
    assert!(job.enter_stage(Stage::Implementing, Utc::now(), max));
}

#[test]
fn reviewing_stage_increments_review_iterations() {
    let mut job = Job::new(RepoSlug("repo-deadbeef".into()), "todo-1", None, Utc::now());
    job.enter_stage(Stage::Testing, Utc::now(), DEFAULT_MAX_STAGE_VISITS);
    job.enter_stage(Stage::Reviewing, Utc::now(), DEFAULT_MAX_STAGE_VISITS);
    assert_eq!(job.review_iterations, 1);
}

#[test]
fn complete_sets_terminal_status_and_timestamp() {
    let mut job = Job::new(RepoSlug("repo-deadbeef".into()), "todo-1", None, Utc::now());
    let now = Utc::now();
    job.complete(now);
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed_at, Some(now));
    assert!(job.status.is_terminal());
}

#[test]
fn abandon_records_reason() {
    let mut job = Job::new(RepoSlug("repo-deadbeef".into()), "todo-1", None, Utc::now());
    job.abandon("requirements contradict each other", Utc::now());
    assert_eq!(job.status, JobStatus::Abandoned);
    assert_eq!(job.abandon_reason.as_deref(), Some("requirements contradict each other"));
}

#[test]
fn record_session_and_commit_append() {
    let mut job = Job::new(RepoSlug("repo-deadbeef".into()), "todo-1", None, Utc::now());
    job.record_session("implement", "agent-1");
    job.record_commit(CommitRecord::new("abc123", "done", Utc::now()));
    assert_eq!(job.sessions.len(), 1);
    assert_eq!(job.commit_log.len(), 1);
}
