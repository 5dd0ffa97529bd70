// SPDX-License-Identifier: MIT

//! Habit loading: named prompt templates with optional per-stage model
//! overrides (spec.md §4.9).

pub mod error;
pub mod habit;
pub mod registry;

pub use error::{HabitError, Result};
pub use habit::{Habit, HabitModels};
pub use registry::HabitRegistry;
