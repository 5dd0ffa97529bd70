// SPDX-License-Identifier: MIT

use super::*;
use incrementum_core::{Job, RepoSlug};
use chrono::Utc;

#[test]
fn event_seq_increments_per_repo() {
    let mut state = StateFile::default();
    assert_eq!(state.next_event_seq("repo-a"), 1);
    assert_eq!(state.next_event_seq("repo-a"), 2);
    assert_eq!(state.next_event_seq("repo-b"), 1);
}

#[test]
fn find_job_exact_key_matches() {
    let mut state = StateFile::default();
    let job = Job::new(RepoSlug("repo-a".into()), "todo-1", None, Utc::now());
    let key = format!("repo-a/{}", job.id.as_str());
    state.jobs.insert(key.clone(), job);
    assert!(state.find_job(&key).is_some());
}

#[test]
fn find_job_by_unique_prefix() {
    let mut state = StateFile::default();
    let job = Job::new(RepoSlug("repo-a".into()), "todo-1", None, Utc::now());
    let id = job.id.as_str().to_string();
    let key = format!("repo-a/{id}");
    state.jobs.insert(key, job);
    let short = &id[..8];
    assert!(state.find_job(short).is_some());
}

#[test]
fn find_job_ambiguous_prefix_returns_none() {
    let mut state = StateFile::default();
    state.jobs.insert("repo-a/job-aaaa1111".into(), Job::new(RepoSlug("repo-a".into()), "todo-1", None, Utc::now()));
    state.jobs.insert("repo-a/job-aaaa2222".into(), Job::new(RepoSlug("repo-a".into()), "todo-2", None, Utc::now()));
    assert!(state.find_job("job-aaaa").is_none());
}

#[test]
fn get_or_create_repo_slug_is_stable_and_recorded() {
    let mut state = StateFile::default();
    let root = std::path::Path::new("/tmp/my-repo");
    let slug_a = state.get_or_create_repo_slug(root);
    let slug_b = state.get_or_create_repo_slug(root);
    assert_eq!(slug_a, slug_b);
    assert_eq!(state.repo_root_for_slug(slug_a.as_str()), Some(&root.to_path_buf()));
}

#[test]
fn get_or_create_repo_slug_distinguishes_distinct_paths() {
    let mut state = StateFile::default();
    let slug_a = state.get_or_create_repo_slug(std::path::Path::new("/tmp/repo-one"));
    let slug_b = state.get_or_create_repo_slug(std::path::Path::new("/tmp/repo-two"));
    assert_ne!(slug_a, slug_b);
    assert_eq!(state.repo_names.len(), 2);
}
