// SPDX-License-Identifier: MIT

use super::*;
use crate::protocol::RpcError;

#[test]
fn ok_result_surfaces_the_result_value() {
    let response = Response::ok("req-1", serde_json::json!({"job_id": "job-1"}));
    let value = ok_result(response).unwrap();
    assert_eq!(value["job_id"], "job-1");
}

#[test]
fn ok_result_turns_an_error_response_into_a_rpc_daemon_error() {
    let response = Response::err("req-1", RpcError::JobNotFound { job_id: "job-1".to_string() });
    let err = ok_result(response).unwrap_err();
    assert!(matches!(err, DaemonError::Rpc(RpcError::JobNotFound { .. })));
}

#[test]
fn ok_result_defaults_a_missing_result_to_null() {
    let response = Response { id: "req-1".to_string(), result: None, error: None };
    let value = ok_result(response).unwrap();
    assert!(value.is_null());
}
