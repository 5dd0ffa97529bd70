// SPDX-License-Identifier: MIT

//! Loads every `*.md` file in the habits directory and resolves a habit by
//! exact name or unique prefix, the same short-id convention the state
//! store uses for jobs (spec.md §4.9, §6 `habit run`).

use crate::error::{HabitError, Result};
use crate::habit::{self, Habit};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default)]
pub struct HabitRegistry {
    habits: BTreeMap<String, Habit>,
}

impl HabitRegistry {
    /// Load every `.md` file directly under `dir`. A directory that
    /// doesn't exist yields an empty registry rather than an error — habits
    /// are optional.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut habits = BTreeMap::new();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self { habits }),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            let contents = std::fs::read_to_string(&path)?;
            let parsed = habit::parse(name, &path, &contents)?;
            habits.insert(name.to_string(), parsed);
        }

        Ok(Self { habits })
    }

    /// Names in alphabetical order, matching how `swarm list`-style
    /// commands enumerate entities.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.habits.keys().map(String::as_str)
    }

    pub fn get(&self, name_or_prefix: &str) -> Result<&Habit> {
        if let Some(habit) = self.habits.get(name_or_prefix) {
            return Ok(habit);
        }

        let mut matches: Vec<&str> = self
            .habits
            .keys()
            .filter(|name| name.starts_with(name_or_prefix))
            .map(String::as_str)
            .collect();

        match matches.len() {
            0 => Err(HabitError::NotFound(name_or_prefix.to_string())),
            1 => Ok(&self.habits[matches.remove(0)]),
            _ => {
                matches.sort_unstable();
                Err(HabitError::Ambiguous(name_or_prefix.to_string(), matches.join(", ")))
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
