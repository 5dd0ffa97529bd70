// SPDX-License-Identifier: MIT

use super::*;
use crate::protocol::{Method, Request, Response};

#[test]
fn encode_returns_json_without_length_prefix() {
    let request = Request::new(Method::List, "req-1", serde_json::Value::Null);
    let bytes = encode(&request).unwrap();
    assert_eq!(bytes[0], b'{');
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let original = encode(&Request::new(Method::List, "req-1", serde_json::Value::Null)).unwrap();
    let mut buffer = Vec::new();
    write_message(&mut buffer, &original).await.unwrap();

    assert_eq!(buffer.len(), 4 + original.len());
    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
    assert_eq!(len as usize, original.len());
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let payload = encode(&Response::ok("req-1", serde_json::json!({"job_id": "job-1"}))).unwrap();
    let mut buffer = Vec::new();
    write_message(&mut buffer, &payload).await.unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.unwrap();
    assert_eq!(read_back, payload);
}

#[tokio::test]
async fn read_message_rejects_a_frame_over_the_size_limit() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&(MAX_FRAME_BYTES + 1).to_be_bytes());

    let mut cursor = std::io::Cursor::new(buffer);
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
}

#[tokio::test]
async fn request_and_response_helpers_roundtrip_through_a_duplex_stream() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let request = Request::new(Method::Do, "req-1", serde_json::json!({"todo_id": "todo-1"}));
    write_request(&mut client, &request).await.unwrap();
    let received = read_request(&mut server).await.unwrap();
    assert_eq!(received.id, "req-1");
    assert_eq!(received.method, Method::Do);

    let response = Response::ok("req-1", serde_json::json!({"job_id": "job-1"}));
    write_response(&mut server, &response).await.unwrap();
    let received = read_response(&mut client).await.unwrap();
    assert_eq!(received.id, "req-1");
    assert_eq!(received.result.unwrap()["job_id"], "job-1");
}
