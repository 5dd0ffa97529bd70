// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn new_commit_record_captures_fields() {
    let now = Utc::now();
    let c = CommitRecord::new("abc123", "fix the thing", now);
    assert_eq!(c.revision, "abc123");
    assert_eq!(c.message, "fix the thing");
    assert_eq!(c.created_at, now);
}
