// SPDX-License-Identifier: MIT

//! The job state machine (spec.md §4.5): drives one todo, or one habit,
//! through implementing -> testing -> reviewing -> committing.
//!
//! Rather than the teacher's function-valued `OnStart`/`OnStageChange`
//! callback fields, lifecycle updates are delivered as `JobLifecycleEvent`
//! values over a subscriber channel; the state machine only produces them.

use crate::error::{EngineError, Result};
use crate::session_registry::SessionRegistry;
use crate::workspace_pool::WorkspacePool;
use chrono::Utc;
use incrementum_adapters::{AgentProcessConfig, AgentOutcome};
use incrementum_core::{CommitRecord, Config, Event, Job, ReviewVerdict, SessionStatus, Stage};
use incrementum_storage::StateStore;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

static NEXT_AGENT_PORT: AtomicU16 = AtomicU16::new(41000);

/// A structured replacement for the teacher's `OnStart`/`OnStageChange`
/// callback fields: the state machine produces these, the caller consumes
/// them however it likes (durable log, swarm tail, CLI progress bar, ...).
#[derive(Debug, Clone)]
pub enum JobLifecycleEvent {
    Started { job_id: String },
    StageChanged { job_id: String, stage: Stage },
    TestResult { job_id: String, passed: bool, attempt: u32 },
    ReviewResult { job_id: String, verdict: String },
    Committed { job_id: String, revision: String, message: String },
    Abandoned { job_id: String, reason: String },
    Completed { job_id: String },
    Failed { job_id: String, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides `Config::agent_binary` for this run.
    pub agent_override: Option<String>,
    /// Outbound channel raw `job.*`/agent events are posted to. Agent
    /// events pass through unchanged; see spec.md §4.5 "Agent events flow
    /// through transparently with their original names."
    pub event_tx: Option<mpsc::Sender<Event>>,
    /// Outbound channel for typed lifecycle notifications — the
    /// replacement for the teacher's `OnStart`/`OnStageChange` callback
    /// fields (spec.md §9).
    pub lifecycle_tx: Option<mpsc::Sender<JobLifecycleEvent>>,
    /// Cooperative cancellation context threaded through every suspension
    /// point in the pipeline (spec.md §5). A default token is never
    /// cancelled, so callers that don't care about cancellation pay nothing.
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub job: Job,
    /// Set when a habit's reviewer yields `artifact(todo-spec)`: the
    /// orchestrator creates a new todo and hands it back alongside the run.
    pub new_todo_spec: Option<String>,
}

pub struct JobMachine {
    store: Arc<StateStore>,
    workspaces: Arc<WorkspacePool>,
    sessions: Arc<SessionRegistry>,
    config: Config,
}

impl JobMachine {
    pub fn new(store: Arc<StateStore>, workspaces: Arc<WorkspacePool>, sessions: Arc<SessionRegistry>, config: Config) -> Self {
        Self { store, workspaces, sessions, config }
    }

    pub async fn run(&self, repo_root: &Path, todo_id: &str, todo_description: &str, options: RunOptions) -> Result<RunResult> {
        self.drive(repo_root, todo_id, None, todo_description, options).await
    }

    pub async fn run_habit(&self, repo_root: &Path, habit_name: &str, habit_prompt: &str, options: RunOptions) -> Result<RunResult> {
        self.drive(repo_root, habit_name, Some(habit_name.to_string()), habit_prompt, options).await
    }

    async fn drive(&self, repo_root: &Path, todo_id: &str, habit_name: Option<String>, instruction: &str, options: RunOptions) -> Result<RunResult> {
        if options.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let repo_slug = incrementum_core::sanitize_repo_name(repo_root);
        let now = Utc::now();

        let purpose = habit_name.as_deref().map(|h| format!("habit: {h}")).unwrap_or_else(|| format!("todo: {todo_id}"));
        let workspace = self.workspaces.acquire(repo_root, "@", purpose).await?;

        let mut job = Job::new(repo_slug.clone(), todo_id, habit_name, now);
        self.persist_job(&job).await?;
        self.emit(&repo_slug, "job.start", &job.id.as_str().to_string(), json!({"todo_id": todo_id}), &options.event_tx).await;
        self.notify(&options, JobLifecycleEvent::Started { job_id: job.id.as_str().to_string() }).await;

        let outcome = self.run_pipeline(&workspace.path, &repo_slug, &mut job, instruction, &options).await;

        let release_result = self.workspaces.release(repo_root, &workspace.name).await;
        if let Err(e) = release_result {
            tracing::warn!(job_id = %job.id, error = %e, "failed to release workspace after run");
        }

        match outcome {
            Ok(new_todo_spec) => {
                self.persist_job(&job).await?;
                Ok(RunResult { job, new_todo_spec })
            }
            Err(e) => {
                self.persist_job(&job).await?;
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, workspace_path: &Path, repo_slug: &incrementum_core::RepoSlug, job: &mut Job, instruction: &str, options: &RunOptions) -> Result<Option<String>> {
        let mut feedback = String::new();
        let mut previous_review_text: Option<String> = None;

        loop {
            self.check_cancelled(job, options)?;
            self.enter_stage(job, Stage::Implementing, options).await?;
            let implement_prompt = implement_prompt(instruction, &feedback);
            let implement_output = self.run_agent_turn(repo_slug, workspace_path, "implement", &implement_prompt, job, options).await?;
            if implement_output.exit_code != 0 {
                job.fail("agent implementation turn exited non-zero", Utc::now());
                self.notify(options, JobLifecycleEvent::Failed { job_id: job.id.as_str().to_string(), reason: job.feedback.clone() }).await;
                return Err(EngineError::External { exit_code: Some(implement_output.exit_code), stderr: String::new() });
            }

            self.enter_stage(job, Stage::Testing, options).await?;
            let test_output = incrementum_shell::run(&self.config.default_test_command, workspace_path, &[]).await?;
            let passed = test_output.success();
            self.emit(repo_slug, "job.test_result", &job.id.as_str().to_string(), json!({"passed": passed}), &options.event_tx).await;
            self.notify(options, JobLifecycleEvent::TestResult { job_id: job.id.as_str().to_string(), passed, attempt: job.test_attempts }).await;

            if !passed {
                if job.test_attempts >= self.config.max_test_retries {
                    job.fail("test retries exhausted", Utc::now());
                    self.notify(options, JobLifecycleEvent::Failed { job_id: job.id.as_str().to_string(), reason: job.feedback.clone() }).await;
                    return Err(EngineError::Validation("test retries exhausted".to_string()));
                }
                feedback = test_output.stderr.trim().to_string();
                job.feedback = feedback.clone();
                continue;
            }

            self.check_cancelled(job, options)?;
            self.enter_stage(job, Stage::Reviewing, options).await?;
            let diff = incrementum_shell::run(&format!("{} diff", self.config.vcs_binary), workspace_path, &[]).await.map(|o| o.stdout).unwrap_or_default();
            let review_prompt = review_prompt(instruction, &diff);
            let review_output = self.run_agent_turn(repo_slug, workspace_path, "review", &review_prompt, job, options).await?;

            let verdict = ReviewVerdict::parse(&review_output.stdout);
            let verdict = match verdict {
                Some(v) => v,
                None => {
                    if let Some(artifact) = parse_artifact_todo_spec(&review_output.stdout) {
                        self.emit(repo_slug, "job.review_result", &job.id.as_str().to_string(), json!({"verdict": "artifact"}), &options.event_tx).await;
                        job.complete(Utc::now());
                        return Ok(Some(artifact));
                    }
                    job.fail("review turn produced no recognizable verdict", Utc::now());
                    self.notify(options, JobLifecycleEvent::Failed { job_id: job.id.as_str().to_string(), reason: job.feedback.clone() }).await;
                    return Err(EngineError::Validation("unrecognized review verdict".to_string()));
                }
            };

            match verdict {
                ReviewVerdict::Accept => {
                    self.emit(repo_slug, "job.review_result", &job.id.as_str().to_string(), json!({"verdict": "accept"}), &options.event_tx).await;
                    self.notify(options, JobLifecycleEvent::ReviewResult { job_id: job.id.as_str().to_string(), verdict: "accept".to_string() }).await;
                    job.feedback.clear();
                    break;
                }
                ReviewVerdict::RequestChanges { feedback: reviewer_feedback } => {
                    self.emit(repo_slug, "job.review_result", &job.id.as_str().to_string(), json!({"verdict": "request_changes"}), &options.event_tx).await;
                    self.notify(options, JobLifecycleEvent::ReviewResult { job_id: job.id.as_str().to_string(), verdict: "request_changes".to_string() }).await;

                    if job.review_iterations >= self.config.max_review_iterations {
                        job.fail("review iterations exhausted", Utc::now());
                        self.notify(options, JobLifecycleEvent::Failed { job_id: job.id.as_str().to_string(), reason: job.feedback.clone() }).await;
                        return Err(EngineError::Validation("review iterations exhausted".to_string()));
                    }

                    let normalized = normalize(&reviewer_feedback);
                    if previous_review_text.as_deref() == Some(normalized.as_str()) {
                        job.abandon("reviewer looped", Utc::now());
                        self.emit(repo_slug, "job.abandon", &job.id.as_str().to_string(), json!({"reason": "reviewer looped"}), &options.event_tx).await;
                        self.notify(options, JobLifecycleEvent::Abandoned { job_id: job.id.as_str().to_string(), reason: "reviewer looped".to_string() }).await;
                        return Err(EngineError::Abandoned("reviewer looped".to_string()));
                    }
                    previous_review_text = Some(normalized);
                    feedback = reviewer_feedback.clone();
                    job.feedback = reviewer_feedback;
                    continue;
                }
                ReviewVerdict::Abandon { reason } => {
                    job.abandon(reason.clone(), Utc::now());
                    self.emit(repo_slug, "job.abandon", &job.id.as_str().to_string(), json!({"reason": reason}), &options.event_tx).await;
                    self.notify(options, JobLifecycleEvent::Abandoned { job_id: job.id.as_str().to_string(), reason: reason.clone() }).await;
                    return Err(EngineError::Abandoned(reason));
                }
            }
        }

        self.check_cancelled(job, options)?;
        self.enter_stage(job, Stage::Committing, options).await?;
        let message = format!("Do {}", job.todo_id);
        let commit_output = incrementum_shell::run(&format!("{} commit -m {}", self.config.vcs_binary, shell_quote(&message)), workspace_path, &[]).await?;
        if !commit_output.success() {
            job.fail("vcs commit failed", Utc::now());
            self.notify(options, JobLifecycleEvent::Failed { job_id: job.id.as_str().to_string(), reason: job.feedback.clone() }).await;
            return Err(EngineError::External { exit_code: Some(commit_output.exit_code), stderr: commit_output.stderr.trim().to_string() });
        }
        let revision = parse_revision(&commit_output.stdout).unwrap_or_else(|| "@-".to_string());
        let commit = CommitRecord::new(revision.clone(), message.clone(), Utc::now());
        job.record_commit(commit);
        self.emit(repo_slug, "job.commit", &job.id.as_str().to_string(), json!({"revision": revision, "message": message}), &options.event_tx).await;
        self.notify(options, JobLifecycleEvent::Committed { job_id: job.id.as_str().to_string(), revision: revision.clone(), message: message.clone() }).await;

        job.complete(Utc::now());
        self.emit(repo_slug, "job.complete", &job.id.as_str().to_string(), json!({}), &options.event_tx).await;
        self.notify(options, JobLifecycleEvent::Completed { job_id: job.id.as_str().to_string() }).await;

        Ok(None)
    }

    /// A cooperative cancellation checkpoint: marks the job failed with a
    /// "cancelled" reason and returns `Cancelled` if the run's token has
    /// fired, otherwise a no-op.
    fn check_cancelled(&self, job: &mut Job, options: &RunOptions) -> Result<()> {
        if options.cancel.is_cancelled() {
            job.fail("cancelled", Utc::now());
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }

    async fn enter_stage(&self, job: &mut Job, stage: Stage, options: &RunOptions) -> Result<()> {
        let exceeded = job.enter_stage(stage, Utc::now(), incrementum_core::DEFAULT_MAX_STAGE_VISITS);
        self.emit(&job.repo_slug.clone(), "job.stage", &job.id.as_str().to_string(), json!({"stage": stage.to_string()}), &options.event_tx).await;
        self.notify(options, JobLifecycleEvent::StageChanged { job_id: job.id.as_str().to_string(), stage }).await;
        if exceeded {
            job.fail(format!("stage {stage} visited too many times"), Utc::now());
            return Err(EngineError::Validation(format!("stage {stage} visited too many times")));
        }
        Ok(())
    }

    async fn run_agent_turn(&self, repo_slug: &incrementum_core::RepoSlug, workspace_path: &Path, purpose: &str, prompt: &str, job: &mut Job, options: &RunOptions) -> Result<AgentOutcome> {
        let port = NEXT_AGENT_PORT.fetch_add(1, Ordering::Relaxed);
        let config = AgentProcessConfig {
            agent_binary: options.agent_override.clone().unwrap_or_else(|| self.config.agent_binary.clone()),
            workspace_path: workspace_path.to_path_buf(),
            prompt: prompt.to_string(),
            port,
            env: Vec::new(),
        };
        let (handle, _shutdown_rx) = incrementum_adapters::spawn(config, self.config.serve_ready_timeout).await?;

        let session_id = format!("{}-{}-{}", job.id.as_str(), purpose, port);
        self.sessions.create_session(repo_slug.clone(), session_id.clone(), prompt.to_string(), Utc::now()).await?;
        job.record_session(purpose, session_id.clone());

        // Cancelling here drops the wait future (and with it the handle,
        // closing its shutdown channel) so a cancelled session is the agent
        // process's own concern to notice and exit, not ours to block on.
        let outcome = tokio::select! {
            outcome = handle.wait() => {
                outcome.ok_or_else(|| EngineError::External { exit_code: None, stderr: "agent process gave no exit status".to_string() })?
            }
            _ = options.cancel.cancelled() => {
                let _ = self.sessions.complete_session(repo_slug.clone(), session_id, SessionStatus::Killed, Utc::now(), None, None).await;
                return Err(EngineError::Cancelled);
            }
        };

        let status = if outcome.exit_code == 0 { SessionStatus::Completed } else { SessionStatus::Failed };
        self.sessions.complete_session(repo_slug.clone(), session_id, status, Utc::now(), Some(outcome.exit_code), None).await?;

        Ok(outcome)
    }

    async fn persist_job(&self, job: &Job) -> Result<()> {
        let key = job.repo_slug.key(job.id.as_str());
        let job = job.clone();
        self.store.mutate(move |state| { state.jobs.insert(key, job); }).await?;
        Ok(())
    }

    async fn emit(&self, repo_slug: &incrementum_core::RepoSlug, kind: &str, entity_id: &str, payload: serde_json::Value, event_tx: &Option<mpsc::Sender<Event>>) {
        let repo_slug_key = repo_slug.as_str().to_string();
        let seq = match self.store.mutate(move |state| state.next_event_seq(&repo_slug_key)).await {
            Ok(seq) => seq,
            Err(e) => {
                tracing::warn!(error = %e, "failed to allocate event sequence number");
                0
            }
        };
        if let Some(tx) = event_tx {
            let event = Event::new(seq, kind.to_string(), entity_id.to_string(), payload, Utc::now());
            let _ = tx.send(event).await;
        }
    }

    async fn notify(&self, options: &RunOptions, event: JobLifecycleEvent) {
        if let Some(tx) = &options.lifecycle_tx {
            let _ = tx.send(event).await;
        }
    }
}

fn implement_prompt(instruction: &str, feedback: &str) -> String {
    if feedback.is_empty() {
        instruction.to_string()
    } else {
        format!("{instruction}\n\nPrevious attempt feedback:\n{feedback}")
    }
}

fn review_prompt(instruction: &str, diff: &str) -> String {
    format!("Review the following change against this task:\n{instruction}\n\nDiff:\n{diff}")
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn parse_artifact_todo_spec(message: &str) -> Option<String> {
    message.lines().find_map(|line| {
        let trimmed = line.trim();
        if !trimmed.to_lowercase().starts_with("artifact(todo-spec)") {
            return None;
        }
        match trimmed.split_once(':') {
            Some((_, rest)) => Some(rest.trim().to_string()),
            None => Some(String::new()),
        }
    })
}

fn parse_revision(commit_stdout: &str) -> Option<String> {
    commit_stdout.lines().find(|l| !l.trim().is_empty()).map(|l| l.trim().to_string())
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
#[path = "job_machine_tests.rs"]
mod tests;
