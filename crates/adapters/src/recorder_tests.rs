// SPDX-License-Identifier: MIT

use super::*;

#[tokio::test]
async fn writes_land_under_the_session_id_once_closed() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::open(dir.path(), "sess-1").await.unwrap();
    recorder.write(b"data: hello\n\n").await.unwrap();
    recorder.close().await.unwrap();

    let contents = std::fs::read_to_string(dir.path().join("sess-1.sse")).unwrap();
    assert_eq!(contents, "data: hello\n\n");
}

#[tokio::test]
async fn the_final_file_does_not_exist_until_close_runs() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::open(dir.path(), "sess-2").await.unwrap();
    recorder.write(b"data: partial\n").await.unwrap();

    assert!(!dir.path().join("sess-2.sse").exists());

    recorder.close().await.unwrap();
    assert!(dir.path().join("sess-2.sse").exists());
}

#[tokio::test]
async fn writes_after_close_fail_with_recorder_closed() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::open(dir.path(), "sess-3").await.unwrap();
    recorder.close().await.unwrap();

    let err = recorder.write(b"late").await.unwrap_err();
    assert!(matches!(err, AdapterError::RecorderClosed));
}

#[tokio::test]
async fn closing_twice_fails_with_recorder_closed() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::open(dir.path(), "sess-4").await.unwrap();
    recorder.close().await.unwrap();

    let err = recorder.close().await.unwrap_err();
    assert!(matches!(err, AdapterError::RecorderClosed));
}
