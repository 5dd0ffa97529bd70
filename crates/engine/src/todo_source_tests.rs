// SPDX-License-Identifier: MIT

use super::memory::InMemoryTodoSource;
use super::*;

fn todo(id: &str, todo_type: &str, priority: u8, status: TodoStatus) -> Todo {
    Todo { id: id.to_string(), title: id.to_string(), description: String::new(), todo_type: todo_type.to_string(), priority, status }
}

#[test]
fn filter_rejects_out_of_range_priority() {
    let filter = TodoFilter { max_priority: Some(9), types: None };
    assert!(filter.validate().is_err());
}

#[test]
fn filter_rejects_interactive_type() {
    let filter = TodoFilter { max_priority: None, types: Some(vec!["interactive".to_string()]) };
    assert!(filter.validate().is_err());
}

#[test]
fn filter_rejects_unknown_type() {
    let filter = TodoFilter { max_priority: None, types: Some(vec!["not-a-type".to_string()]) };
    assert!(filter.validate().is_err());
}

#[test]
fn filter_never_matches_interactive_todos() {
    let filter = TodoFilter::default();
    let design = todo("t1", INTERACTIVE_TYPE, 1, TodoStatus::Open);
    assert!(!filter.matches(&design));
}

#[test]
fn filter_excludes_non_open_todos() {
    let filter = TodoFilter::default();
    let done = todo("t1", "feature", 1, TodoStatus::Done);
    assert!(!filter.matches(&done));
}

#[tokio::test]
async fn next_ready_picks_lowest_priority_number() {
    let source = InMemoryTodoSource::new(vec![
        todo("low-priority-work", "feature", 5, TodoStatus::Open),
        todo("high-priority-work", "bug", 1, TodoStatus::Open),
    ]);
    let picked = source.next_ready(&TodoFilter::default()).await.unwrap().unwrap();
    assert_eq!(picked.id, "high-priority-work");
}

#[tokio::test]
async fn next_ready_skips_design_todos() {
    let source = InMemoryTodoSource::new(vec![todo("design-1", INTERACTIVE_TYPE, 1, TodoStatus::Open)]);
    let picked = source.next_ready(&TodoFilter::default()).await.unwrap();
    assert!(picked.is_none());
}

#[tokio::test]
async fn next_ready_honors_priority_ceiling_and_type_filter() {
    let source = InMemoryTodoSource::new(vec![
        todo("t-feature", "feature", 3, TodoStatus::Open),
        todo("t-bug-low", "bug", 2, TodoStatus::Open),
        todo("t-bug-too-low-priority-number", "bug", 5, TodoStatus::Open),
    ]);
    let filter = TodoFilter { max_priority: Some(3), types: Some(vec!["bug".to_string()]) };
    let picked = source.next_ready(&filter).await.unwrap().unwrap();
    assert_eq!(picked.id, "t-bug-low");
}

#[tokio::test]
async fn mark_status_transitions_a_todo() {
    let source = InMemoryTodoSource::new(vec![todo("t1", "feature", 1, TodoStatus::Open)]);
    source.mark_status("t1", TodoStatus::Done).await.unwrap();
    let listed = source.list().await.unwrap();
    assert_eq!(listed[0].status, TodoStatus::Done);
}

#[tokio::test]
async fn mark_status_on_unknown_id_is_not_found() {
    let source = InMemoryTodoSource::new(vec![]);
    assert!(source.mark_status("missing", TodoStatus::Done).await.is_err());
}
