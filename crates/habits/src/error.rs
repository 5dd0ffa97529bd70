// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HabitError {
    #[error("habit '{0}' not found")]
    NotFound(String),

    #[error("habit name '{0}' is ambiguous between: {1}")]
    Ambiguous(String, String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HabitError>;
