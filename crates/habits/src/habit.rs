// SPDX-License-Identifier: MIT

//! A habit: a named, repeatable prompt template with optional per-stage
//! model overrides, stored as a markdown file with YAML frontmatter
//! (spec.md §4.9).
//!
//! Only `models.implementation` and `models.review` are recognized
//! frontmatter keys; anything else is logged and ignored rather than
//! rejected, so habit authors can annotate files with metadata the
//! orchestrator doesn't (yet) understand.

use crate::error::{HabitError, Result};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitModels {
    pub implementation: Option<String>,
    pub review: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Habit {
    pub name: String,
    pub prompt: String,
    pub models: HabitModels,
}

pub fn parse(name: &str, _path: &Path, contents: &str) -> Result<Habit> {
    let matter = Matter::<YAML>::new();
    let parsed = matter.parse::<serde_yaml::Value>(contents);

    let models = match &parsed.data {
        Some(frontmatter) => extract_models(frontmatter, name),
        None => HabitModels::default(),
    };

    Ok(Habit {
        name: name.to_string(),
        prompt: parsed.content.trim().to_string(),
        models,
    })
}

fn extract_models(frontmatter: &serde_yaml::Value, habit_name: &str) -> HabitModels {
    let mut models = HabitModels::default();

    let serde_yaml::Value::Mapping(top) = frontmatter else {
        return models;
    };

    for (key, value) in top {
        let Some(key) = key.as_str() else { continue };
        if key != "models" {
            tracing::warn!(habit = habit_name, key, "unrecognized habit frontmatter key, ignoring");
            continue;
        }
        let serde_yaml::Value::Mapping(models_map) = value else {
            tracing::warn!(habit = habit_name, "'models' frontmatter key is not a mapping, ignoring");
            continue;
        };
        for (mkey, mvalue) in models_map {
            let Some(mkey) = mkey.as_str() else { continue };
            let value = mvalue.as_str().map(str::to_string);
            match mkey {
                "implementation" => models.implementation = value,
                "review" => models.review = value,
                other => {
                    tracing::warn!(habit = habit_name, key = other, "unrecognized models frontmatter key, ignoring");
                }
            }
        }
    }

    models
}

#[cfg(test)]
#[path = "habit_tests.rs"]
mod tests;
