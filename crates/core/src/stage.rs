// SPDX-License-Identifier: MIT

//! The stage pipeline a job moves through: implementing -> testing ->
//! reviewing -> committing. `Stage`'s derived `Ord` reflects pipeline order,
//! with `Implementing` sorting first, matching spec's tie-breaker rule.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Implementing,
    Testing,
    Reviewing,
    Committing,
}

impl Stage {
    pub const ALL: [Stage; 4] =
        [Stage::Implementing, Stage::Testing, Stage::Reviewing, Stage::Committing];

    /// The stage immediately after this one, or `None` for `Committing`.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Implementing => Some(Stage::Testing),
            Stage::Testing => Some(Stage::Reviewing),
            Stage::Reviewing => Some(Stage::Committing),
            Stage::Committing => None,
        }
    }

    /// Validate that `sequence` is a prefix of (implementing, testing,
    /// reviewing, committing) within each retry pass — used by tests
    /// asserting the stage-ordering invariant. A pass starts at the first
    /// element or any later `Implementing` (retry loops restart the
    /// pipeline); within a pass stages must strictly advance.
    pub fn is_valid_prefix(sequence: &[Stage]) -> bool {
        let mut floor = Stage::Implementing;
        let mut started = false;
        for &stage in sequence {
            if stage == Stage::Implementing {
                floor = Stage::Implementing;
                started = true;
                continue;
            }
            if !started || stage <= floor {
                return false;
            }
            floor = stage;
        }
        true
    }
}

crate::simple_display! {
    Stage {
        Implementing => "implementing",
        Testing => "testing",
        Reviewing => "reviewing",
        Committing => "committing",
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
