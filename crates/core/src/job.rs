// SPDX-License-Identifier: MIT

//! A job: one todo item being driven through the implement/test/review/commit
//! pipeline (spec.md §3 "Job", §4.5).

use crate::commit::CommitRecord;
use crate::define_id;
use crate::repo_slug::RepoSlug;
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

define_id! {
    pub struct JobId("job-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Completed,
    Failed,
    Abandoned,
}

crate::simple_display! {
    JobStatus {
        Active => "active",
        Completed => "completed",
        Failed => "failed",
        Abandoned => "abandoned",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Active)
    }
}

/// One transition into a stage, appended to `Job::stage_history` every time
/// the job enters (or re-enters, on retry) a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub entered_at: DateTime<Utc>,
}

/// A pointer from a job to one of the agent sessions it spawned, tagged
/// with why that session was spawned (e.g. "implement", "review attempt 2").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSessionRef {
    pub purpose: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub repo_slug: RepoSlug,
    pub todo_id: String,
    pub stage: Stage,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandon_reason: Option<String>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub commit_log: Vec<CommitRecord>,
    #[serde(default)]
    pub sessions: Vec<AgentSessionRef>,
    #[serde(default)]
    pub stage_history: Vec<StageRecord>,
    #[serde(default)]
    pub stage_visits: HashMap<Stage, u32>,
    #[serde(default)]
    pub review_iterations: u32,
    #[serde(default)]
    pub test_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_name: Option<String>,
}

/// Default cap on visits to a single stage before the job is force-failed,
/// breaking infinite implement/test retry loops. Overridable via `Config`.
pub const DEFAULT_MAX_STAGE_VISITS: u32 = 8;

impl Job {
    pub fn new(repo_slug: RepoSlug, todo_id: impl Into<String>, habit_name: Option<String>, now: DateTime<Utc>) -> Self {
        let mut stage_visits = HashMap::new();
        stage_visits.insert(Stage::Implementing, 1);
        Self {
            id: JobId::new(),
            repo_slug,
            todo_id: todo_id.into(),
            stage: Stage::Implementing,
            status: JobStatus::Active,
            started_at: now,
            updated_at: now,
            completed_at: None,
            abandon_reason: None,
            feedback: String::new(),
            commit_log: Vec::new(),
            sessions: Vec::new(),
            stage_history: vec![StageRecord { stage: Stage::Implementing, entered_at: now }],
            stage_visits,
            review_iterations: 0,
            test_attempts: 0,
            habit_name,
        }
    }

    /// Move the job to `stage`, recording history and bumping the visit
    /// counter. Returns `true` if the new visit count exceeds `max_visits`,
    /// meaning the caller should force-fail the job instead of proceeding.
    #[must_use]
    pub fn enter_stage(&mut self, stage: Stage, now: DateTime<Utc>, max_visits: u32) -> bool {
        self.stage = stage;
        self.stage_history.push(StageRecord { stage, entered_at: now });
        self.updated_at = now;
        let visits = self.stage_visits.entry(stage).or_insert(0);
        *visits += 1;
        if stage == Stage::Testing {
            self.test_attempts += 1;
        }
        if stage == Stage::Reviewing {
            self.review_iterations += 1;
        }
        *visits > max_visits
    }

    pub fn record_session(&mut self, purpose: impl Into<String>, session_id: impl Into<String>) {
        self.sessions.push(AgentSessionRef { purpose: purpose.into(), session_id: session_id.into() });
    }

    pub fn record_commit(&mut self, commit: CommitRecord) {
        self.commit_log.push(commit);
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn fail(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.feedback = reason.into();
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn abandon(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = JobStatus::Abandoned;
        self.abandon_reason = Some(reason.into());
        self.completed_at = Some(now);
        self.updated_at = now;
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            todo_id: String = "todo-1",
            feedback: String = "",
        }
        set {
            repo_slug: RepoSlug = RepoSlug("repo-00000000".to_string()),
            stage: Stage = Stage::Implementing,
            status: JobStatus = JobStatus::Active,
            completed_at: Option<DateTime<Utc>> = None,
            abandon_reason: Option<String> = None,
            commit_log: Vec<CommitRecord> = Vec::new(),
            sessions: Vec<AgentSessionRef> = Vec::new(),
            stage_history: Vec<StageRecord> = Vec::new(),
            stage_visits: HashMap<Stage, u32> = HashMap::new(),
            review_iterations: u32 = 0,
            test_attempts: u32 = 0,
            habit_name: Option<String> = None,
        }
        computed {
            id: JobId = JobId::new(),
            started_at: DateTime<Utc> = Utc::now(),
            updated_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
