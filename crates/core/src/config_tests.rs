// SPDX-License-Identifier: MIT

use super::*;
use serial_test::serial;
use std::io::Write;

#[test]
fn defaults_are_sane() {
    let cfg = Config::default();
    assert_eq!(cfg.max_test_retries, 3);
    assert_eq!(cfg.max_review_iterations, 5);
    assert_eq!(cfg.agent_binary, "coop");
    assert_eq!(cfg.session_lookup_timeout, std::time::Duration::from_secs(5));
    assert_eq!(cfg.serve_ready_timeout, std::time::Duration::from_secs(5));
    assert_eq!(cfg.discovery_tolerance, std::time::Duration::from_secs(30));
}

#[test]
#[serial]
fn xdg_state_home_relocates_state_and_events_dirs() {
    std::env::set_var("XDG_STATE_HOME", "/tmp/incrementum-xdg-test");
    let cfg = Config::load(Some(Path::new("/nonexistent/config.toml")), ConfigOverride::default()).unwrap();
    assert_eq!(cfg.state_dir, Path::new("/tmp/incrementum-xdg-test/incrementum/state"));
    assert_eq!(cfg.events_dir, Path::new("/tmp/incrementum-xdg-test/incrementum/events"));
    std::env::remove_var("XDG_STATE_HOME");
}

#[test]
#[serial]
fn env_vars_override_defaults() {
    std::env::set_var("INCREMENTUM_MAX_TEST_RETRIES", "9");
    std::env::set_var("INCREMENTUM_AGENT_BINARY", "my-agent");
    let cfg = Config::load(Some(Path::new("/nonexistent/config.toml")), ConfigOverride::default()).unwrap();
    assert_eq!(cfg.max_test_retries, 9);
    assert_eq!(cfg.agent_binary, "my-agent");
    std::env::remove_var("INCREMENTUM_MAX_TEST_RETRIES");
    std::env::remove_var("INCREMENTUM_AGENT_BINARY");
}

#[test]
#[serial]
fn builder_override_wins_over_env() {
    std::env::set_var("INCREMENTUM_MAX_TEST_RETRIES", "9");
    let overrides = ConfigOverride { max_test_retries: Some(1), ..Default::default() };
    let cfg = Config::load(Some(Path::new("/nonexistent/config.toml")), overrides).unwrap();
    assert_eq!(cfg.max_test_retries, 1);
    std::env::remove_var("INCREMENTUM_MAX_TEST_RETRIES");
}

#[test]
fn toml_file_is_applied_between_defaults_and_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"max_review_iterations = 2
vcs_binary = "hg""#).unwrap();
    let cfg = Config::load(Some(file.path()), ConfigOverride::default()).unwrap();
    assert_eq!(cfg.max_review_iterations, 2);
    assert_eq!(cfg.vcs_binary, "hg");
}

#[test]
fn malformed_toml_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "not valid = = toml").unwrap();
    let result = Config::load(Some(file.path()), ConfigOverride::default());
    assert!(result.is_err());
}
