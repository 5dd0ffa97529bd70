// SPDX-License-Identifier: MIT

//! The do-all loop (spec.md §4.8): repeatedly select the next ready todo
//! and drive it through [`JobMachine`], falling back to a round-robin of
//! habits once the todo store reports nothing ready. A non-habit
//! iteration resets the round-robin index, since habits are background
//! filler, not the preferred work.

use crate::error::{EngineError, Result};
use crate::job_machine::{JobMachine, RunOptions, RunResult};
use crate::todo_source::{TodoFilter, TodoSource, TodoStatus};
use incrementum_core::JobStatus;
use incrementum_habits::HabitRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// Which unit of work one loop iteration ran, and how the job machine left
/// it. A run `Err` (other than `Cancelled`, which stops the loop entirely)
/// is recorded here rather than aborting the remaining iterations.
pub enum Iteration {
    Todo { todo_id: String, result: Result<RunResult> },
    Habit { habit_name: String, result: Result<RunResult> },
}

#[derive(Debug, Default)]
pub struct DoAllSummary {
    pub todos_run: u32,
    pub habits_run: u32,
    pub failures: u32,
    /// `artifact(todo-spec)` strings surfaced by habit reviewers; this
    /// crate has no `TodoSource::create`, so turning these into real todos
    /// is left to whoever called the loop (spec.md §4.8 supplement).
    pub new_todo_specs: Vec<String>,
}

impl DoAllSummary {
    fn record(&mut self, iteration: Iteration) {
        match iteration {
            Iteration::Todo { result, .. } => {
                self.todos_run += 1;
                self.absorb(result);
            }
            Iteration::Habit { result, .. } => {
                self.habits_run += 1;
                self.absorb(result);
            }
        }
    }

    fn absorb(&mut self, result: Result<RunResult>) {
        match result {
            Ok(run) => {
                if let Some(spec) = run.new_todo_spec {
                    self.new_todo_specs.push(spec);
                }
            }
            Err(_) => self.failures += 1,
        }
    }
}

pub struct DoAllLoop {
    job_machine: Arc<JobMachine>,
    todos: Arc<dyn TodoSource>,
    habits: Option<HabitRegistry>,
    repo_root: PathBuf,
    filter: TodoFilter,
    habit_index: usize,
}

impl DoAllLoop {
    /// `habits: None` disables the `--habits` fallback entirely, matching
    /// spec.md §4.8's "optionally round-robin habits when empty."
    pub fn new(job_machine: Arc<JobMachine>, todos: Arc<dyn TodoSource>, habits: Option<HabitRegistry>, repo_root: PathBuf, filter: TodoFilter) -> Result<Self> {
        filter.validate()?;
        Ok(Self { job_machine, todos, habits, repo_root, filter, habit_index: 0 })
    }

    /// Run one iteration: the next ready todo if one exists, else the next
    /// habit in round-robin order if any are configured. `Ok(None)` means
    /// both sources are exhausted and the loop should stop.
    pub async fn step(&mut self, options: RunOptions) -> Result<Option<Iteration>> {
        if options.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        match self.select_next().await? {
            Some(SelectedWork::Todo(todo)) => {
                let todo_id = todo.id.clone();
                let result = self.job_machine.run(&self.repo_root, &todo.id, &todo.description, options).await;
                if let Err(EngineError::Cancelled) = &result {
                    return Err(EngineError::Cancelled);
                }
                if let Ok(run) = &result {
                    if run.job.status == JobStatus::Completed {
                        self.todos.mark_status(&todo_id, TodoStatus::Done).await?;
                    }
                }
                Ok(Some(Iteration::Todo { todo_id, result }))
            }
            Some(SelectedWork::Habit { name, prompt }) => {
                let result = self.job_machine.run_habit(&self.repo_root, &name, &prompt, options).await;
                if let Err(EngineError::Cancelled) = &result {
                    return Err(EngineError::Cancelled);
                }
                Ok(Some(Iteration::Habit { habit_name: name, result }))
            }
            None => Ok(None),
        }
    }

    /// Loop `step` until both sources are exhausted or `options.cancel`
    /// fires. `options` is cloned per iteration; a fresh `Event`/lifecycle
    /// receiver pair is the caller's to drain across every run.
    pub async fn run_until_exhausted(&mut self, options: RunOptions) -> Result<DoAllSummary> {
        let mut summary = DoAllSummary::default();
        loop {
            match self.step(options.clone()).await? {
                None => return Ok(summary),
                Some(iteration) => summary.record(iteration),
            }
        }
    }

    /// The selection policy in isolation: the next ready todo resets the
    /// round-robin index (habits are background filler, never preferred
    /// over real work); once the store is empty, habits are offered in
    /// turn and the index advances for next time.
    async fn select_next(&mut self) -> Result<Option<SelectedWork>> {
        if let Some(todo) = self.todos.next_ready(&self.filter).await? {
            self.habit_index = 0;
            return Ok(Some(SelectedWork::Todo(todo)));
        }

        let Some(habits) = &self.habits else {
            return Ok(None);
        };
        let names: Vec<String> = habits.names().map(str::to_string).collect();
        if names.is_empty() {
            return Ok(None);
        }

        let index = self.habit_index % names.len();
        let name = names[index].clone();
        self.habit_index = (self.habit_index + 1) % names.len();
        let prompt = habits.get(&name)?.prompt.clone();
        Ok(Some(SelectedWork::Habit { name, prompt }))
    }
}

enum SelectedWork {
    Todo(crate::todo_source::Todo),
    Habit { name: String, prompt: String },
}

#[cfg(test)]
#[path = "do_all_tests.rs"]
mod tests;
