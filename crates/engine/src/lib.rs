// SPDX-License-Identifier: MIT

//! Orchestration: workspace pool, todo source interface, agent session
//! registry, and the job state machine that drives one todo or habit
//! through implementing -> testing -> reviewing -> committing.

pub mod do_all;
pub mod error;
pub mod event_bus;
pub mod job_machine;
pub mod session_registry;
pub mod todo_source;
pub mod workspace_pool;

pub use do_all::{DoAllLoop, DoAllSummary, Iteration};
pub use error::{EngineError, Result};
pub use event_bus::{EventBus, TAIL_HIGH_WATER_MARK};
pub use job_machine::{JobLifecycleEvent, JobMachine, RunOptions, RunResult};
pub use session_registry::SessionRegistry;
pub use todo_source::{Todo, TodoFilter, TodoSource, TodoStatus};
pub use workspace_pool::WorkspacePool;
