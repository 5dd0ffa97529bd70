// SPDX-License-Identifier: MIT

use super::*;

#[tokio::test]
async fn runs_a_simple_command_and_captures_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let output = run("echo hello", dir.path(), &[]).await.unwrap();
    assert!(output.success());
    assert_eq!(output.stdout.trim(), "hello");
}

#[tokio::test]
async fn nonzero_exit_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run("sh -c 'exit 7'", dir.path(), &[]).await.unwrap();
    assert!(!output.success());
    assert_eq!(output.exit_code, 7);
}

#[tokio::test]
async fn env_vars_are_visible_to_the_command() {
    let dir = tempfile::tempdir().unwrap();
    let env = vec![("INCREMENTUM_TEST_VAR".to_string(), "xyz".to_string())];
    let output = run("sh -c 'echo $INCREMENTUM_TEST_VAR'", dir.path(), &env).await.unwrap();
    assert_eq!(output.stdout.trim(), "xyz");
}

#[tokio::test]
async fn malformed_quoting_surfaces_as_tokenize_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = run("echo 'unterminated", dir.path(), &[]).await;
    assert!(result.is_err());
}
