// SPDX-License-Identifier: MIT

//! The durable state store: a locked, rewrite-on-mutate JSON file holding
//! every job, session, and workspace record (spec.md §4.1).

pub mod error;
pub mod event_log;
pub mod state;
pub mod store;

pub use error::{Result, StorageError};
pub use event_log::{read_events, EventLogWriter};
pub use state::StateFile;
pub use store::StateStore;
