// SPDX-License-Identifier: MIT

//! The agent binary contract is assumed, not implemented (spec.md §6), so
//! there is no real process to drive the full pipeline against in tests.
//! These cover the pure helpers the pipeline relies on instead; adapters's
//! own test suite covers process spawning and SSE decoding in isolation.

use super::*;

#[test]
fn implement_prompt_appends_feedback_only_when_present() {
    assert_eq!(implement_prompt("do the thing", ""), "do the thing");
    let with_feedback = implement_prompt("do the thing", "tests failed: foo");
    assert!(with_feedback.contains("do the thing"));
    assert!(with_feedback.contains("tests failed: foo"));
}

#[test]
fn review_prompt_includes_instruction_and_diff() {
    let prompt = review_prompt("add a widget", "+fn widget() {}");
    assert!(prompt.contains("add a widget"));
    assert!(prompt.contains("+fn widget() {}"));
}

#[test]
fn normalize_collapses_whitespace_and_case() {
    assert_eq!(normalize("Fix   the\nTests"), "fix the tests");
    assert_eq!(normalize("fix the tests"), normalize("  Fix The Tests  "));
}

#[test]
fn parse_artifact_todo_spec_extracts_trailing_text() {
    let message = "Looks complete.\nartifact(todo-spec): add a followup cleanup todo\n";
    assert_eq!(parse_artifact_todo_spec(message).as_deref(), Some("add a followup cleanup todo"));
}

#[test]
fn parse_artifact_todo_spec_returns_none_without_the_marker() {
    assert_eq!(parse_artifact_todo_spec("LGTM"), None);
}

#[test]
fn parse_revision_takes_first_nonblank_line() {
    assert_eq!(parse_revision("\n\nabc123def\nDo the thing\n").as_deref(), Some("abc123def"));
}

#[test]
fn parse_revision_of_empty_output_is_none() {
    assert_eq!(parse_revision("   \n\n"), None);
}

#[test]
fn shell_quote_escapes_embedded_single_quotes() {
    assert_eq!(shell_quote("it's fine"), r"'it'\''s fine'");
}
