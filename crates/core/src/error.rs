// SPDX-License-Identifier: MIT

//! The error type shared across crates for domain-level failures that
//! don't belong to a single crate's own error enum (config loading, id
//! parsing, stage-sequencing violations).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid stage transition: {from} -> {to}")]
    InvalidStageTransition { from: String, to: String },

    #[error("stage {stage} exceeded max visits ({max})")]
    StageVisitsExceeded { stage: String, max: u32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
