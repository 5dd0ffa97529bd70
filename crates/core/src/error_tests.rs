// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn invalid_stage_transition_formats_both_stages() {
    let e = Error::InvalidStageTransition { from: "testing".into(), to: "implementing".into() };
    assert_eq!(e.to_string(), "invalid stage transition: testing -> implementing");
}

#[test]
fn io_error_converts_via_from() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let e: Error = io_err.into();
    assert!(matches!(e, Error::Io(_)));
}
