// SPDX-License-Identifier: MIT

use super::*;
use std::path::PathBuf;

fn path() -> PathBuf {
    PathBuf::from("habits/refactor.md")
}

#[test]
fn parses_recognized_model_keys() {
    let contents = "---\nmodels:\n  implementation: sonnet\n  review: opus\n---\nDo the refactor.";
    let habit = parse("refactor", &path(), contents).unwrap();
    assert_eq!(habit.models.implementation.as_deref(), Some("sonnet"));
    assert_eq!(habit.models.review.as_deref(), Some("opus"));
    assert_eq!(habit.prompt, "Do the refactor.");
}

#[test]
fn ignores_unrecognized_top_level_keys() {
    let contents = "---\nowner: alice\nmodels:\n  implementation: sonnet\n---\nPrompt body";
    let habit = parse("refactor", &path(), contents).unwrap();
    assert_eq!(habit.models.implementation.as_deref(), Some("sonnet"));
}

#[test]
fn ignores_unrecognized_models_subkeys() {
    let contents = "---\nmodels:\n  implementation: sonnet\n  planning: haiku\n---\nPrompt body";
    let habit = parse("refactor", &path(), contents).unwrap();
    assert_eq!(habit.models.implementation.as_deref(), Some("sonnet"));
    assert_eq!(habit.models.review, None);
}

#[test]
fn tolerates_quoted_scalars() {
    let contents = "---\nmodels:\n  implementation: \"sonnet-4\"\n---\nBody";
    let habit = parse("refactor", &path(), contents).unwrap();
    assert_eq!(habit.models.implementation.as_deref(), Some("sonnet-4"));
}

#[test]
fn missing_frontmatter_yields_default_models() {
    let habit = parse("refactor", &path(), "# just a markdown file\n").unwrap();
    assert_eq!(habit.models, HabitModels::default());
    assert_eq!(habit.prompt, "# just a markdown file");
}

#[test]
fn no_models_key_yields_empty_models() {
    let contents = "---\nowner: alice\n---\nPrompt body";
    let habit = parse("refactor", &path(), contents).unwrap();
    assert_eq!(habit.models, HabitModels::default());
}
