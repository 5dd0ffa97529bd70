// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn parses_accept_envelope() {
    let msg = r#"Looks good. {"verdict": "accept"}"#;
    assert_eq!(ReviewVerdict::parse(msg), Some(ReviewVerdict::Accept));
}

#[test]
fn parses_request_changes_envelope() {
    let msg = r#"{"verdict": "request_changes", "feedback": "add tests"}"#;
    assert_eq!(
        ReviewVerdict::parse(msg),
        Some(ReviewVerdict::RequestChanges { feedback: "add tests".to_string() })
    );
}

#[test]
fn parses_abandon_envelope() {
    let msg = r#"{"verdict": "abandon", "reason": "todo is unimplementable"}"#;
    assert_eq!(
        ReviewVerdict::parse(msg),
        Some(ReviewVerdict::Abandon { reason: "todo is unimplementable".to_string() })
    );
}

#[test]
fn falls_back_to_lgtm_sentinel() {
    assert_eq!(ReviewVerdict::parse("looks fine\nLGTM"), Some(ReviewVerdict::Accept));
}

#[test]
fn falls_back_to_request_changes_sentinel() {
    assert_eq!(
        ReviewVerdict::parse("REQUEST CHANGES: please rename the variable"),
        Some(ReviewVerdict::RequestChanges { feedback: "please rename the variable".to_string() })
    );
}

#[test]
fn falls_back_to_abandon_sentinel_case_insensitive() {
    assert_eq!(
        ReviewVerdict::parse("abandon: requirements contradict each other"),
        Some(ReviewVerdict::Abandon { reason: "requirements contradict each other".to_string() })
    );
}

#[test]
fn malformed_envelope_falls_back_to_sentinel() {
    let msg = "{\"verdict\": \"unknown_verdict\"}\nLGTM";
    assert_eq!(ReviewVerdict::parse(msg), Some(ReviewVerdict::Accept));
}

#[test]
fn picks_the_last_envelope_when_scratch_json_precedes_it() {
    let msg = r#"Considering the diff: {"issues_found": 2, "verdict": "request_changes"}

    After a closer look the issues are not blocking.
    {"verdict": "accept"}"#;
    assert_eq!(ReviewVerdict::parse(msg), Some(ReviewVerdict::Accept));
}

#[test]
fn no_envelope_or_sentinel_is_none() {
    assert_eq!(ReviewVerdict::parse("I think this is fine but let me keep looking"), None);
}
