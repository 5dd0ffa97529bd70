// SPDX-License-Identifier: MIT

//! The swarm RPC server (spec.md §4.7): exposes Do/Kill/Tail/Logs/List
//! over a localhost TCP socket resolved per-repo.

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;

pub use client::Client;
pub use error::{DaemonError, Result};
pub use server::{resolve_addr, Server, ServerContext};
