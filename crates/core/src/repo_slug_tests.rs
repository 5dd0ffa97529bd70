// SPDX-License-Identifier: MIT

use super::*;
use std::path::PathBuf;

#[test]
fn deterministic_for_same_path() {
    let p = PathBuf::from("/home/user/my-repo");
    assert_eq!(sanitize_repo_name(&p), sanitize_repo_name(&p));
}

#[test]
fn distinguishes_same_basename_different_parents() {
    let a = sanitize_repo_name(&PathBuf::from("/home/alice/repo"));
    let b = sanitize_repo_name(&PathBuf::from("/home/bob/repo"));
    assert_ne!(a, b);
}

#[test]
fn is_filesystem_safe() {
    let slug = sanitize_repo_name(&PathBuf::from("/tmp/My Repo!! (v2)"));
    assert!(slug.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
}

#[test]
fn key_joins_slug_and_entity_id() {
    let slug = RepoSlug("foo-1234abcd".to_string());
    assert_eq!(slug.key("job-abc"), "foo-1234abcd/job-abc");
}
