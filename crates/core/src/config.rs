// SPDX-License-Identifier: MIT

//! Runtime configuration, layered builder-override -> environment ->
//! `$XDG_CONFIG_HOME/incrementum/config.toml` -> built-in defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub events_dir: PathBuf,
    pub lock_timeout: Duration,
    pub session_lookup_timeout: Duration,
    pub serve_ready_timeout: Duration,
    pub max_test_retries: u32,
    pub max_review_iterations: u32,
    pub discovery_tolerance: Duration,
    pub agent_binary: String,
    pub vcs_binary: String,
    pub default_test_command: String,
}

/// Mirrors `Config`'s fields but every field optional, for merging layers
/// read from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub state_dir: Option<PathBuf>,
    pub events_dir: Option<PathBuf>,
    pub lock_timeout_secs: Option<u64>,
    pub session_lookup_timeout_secs: Option<u64>,
    pub serve_ready_timeout_secs: Option<u64>,
    pub max_test_retries: Option<u32>,
    pub max_review_iterations: Option<u32>,
    pub discovery_tolerance_secs: Option<u64>,
    pub agent_binary: Option<String>,
    pub vcs_binary: Option<String>,
    pub default_test_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let state_home = dirs::state_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            state_dir: state_home.join("incrementum").join("state"),
            events_dir: state_home.join("incrementum").join("events"),
            lock_timeout: Duration::from_secs(10),
            session_lookup_timeout: Duration::from_secs(5),
            serve_ready_timeout: Duration::from_secs(5),
            max_test_retries: 3,
            max_review_iterations: 5,
            discovery_tolerance: Duration::from_secs(30),
            agent_binary: "coop".to_string(),
            vcs_binary: "jj".to_string(),
            default_test_command: "cargo test".to_string(),
        }
    }
}

/// Builder-style override, applied last so callers (CLI flags, tests) win
/// over every other layer.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverride {
    pub state_dir: Option<PathBuf>,
    pub events_dir: Option<PathBuf>,
    pub max_test_retries: Option<u32>,
    pub max_review_iterations: Option<u32>,
    pub agent_binary: Option<String>,
    pub vcs_binary: Option<String>,
    pub default_test_command: Option<String>,
}

impl Config {
    /// Load `Config` by layering, lowest precedence first: defaults, the
    /// TOML file at `config_path` (or the XDG default if `None` and the
    /// file exists), environment variables (`INCREMENTUM_*`), then
    /// `overrides`.
    pub fn load(config_path: Option<&Path>, overrides: ConfigOverride) -> Result<Config, crate::Error> {
        let mut cfg = Config::default();

        let path = config_path.map(Path::to_path_buf).or_else(default_config_path);
        if let Some(path) = path {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                let file: ConfigFile = toml::from_str(&contents)
                    .map_err(|e| crate::Error::Config(format!("{}: {e}", path.display())))?;
                apply_file(&mut cfg, file);
            }
        }

        apply_env(&mut cfg);
        apply_override(&mut cfg, overrides);

        Ok(cfg)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("incrementum").join("config.toml"))
}

fn apply_file(cfg: &mut Config, file: ConfigFile) {
    if let Some(v) = file.state_dir {
        cfg.state_dir = v;
    }
    if let Some(v) = file.events_dir {
        cfg.events_dir = v;
    }
    if let Some(v) = file.lock_timeout_secs {
        cfg.lock_timeout = Duration::from_secs(v);
    }
    if let Some(v) = file.session_lookup_timeout_secs {
        cfg.session_lookup_timeout = Duration::from_secs(v);
    }
    if let Some(v) = file.serve_ready_timeout_secs {
        cfg.serve_ready_timeout = Duration::from_secs(v);
    }
    if let Some(v) = file.max_test_retries {
        cfg.max_test_retries = v;
    }
    if let Some(v) = file.max_review_iterations {
        cfg.max_review_iterations = v;
    }
    if let Some(v) = file.discovery_tolerance_secs {
        cfg.discovery_tolerance = Duration::from_secs(v);
    }
    if let Some(v) = file.agent_binary {
        cfg.agent_binary = v;
    }
    if let Some(v) = file.vcs_binary {
        cfg.vcs_binary = v;
    }
    if let Some(v) = file.default_test_command {
        cfg.default_test_command = v;
    }
}

fn apply_env(cfg: &mut Config) {
    // XDG_DATA_HOME applies first so XDG_STATE_HOME (the spec's primary base
    // for state.json and the event log) wins when both are set.
    if let Ok(v) = std::env::var("XDG_DATA_HOME") {
        let base = PathBuf::from(v).join("incrementum");
        cfg.state_dir = base.join("state");
        cfg.events_dir = base.join("events");
    }
    if let Ok(v) = std::env::var("XDG_STATE_HOME") {
        let base = PathBuf::from(v).join("incrementum");
        cfg.state_dir = base.join("state");
        cfg.events_dir = base.join("events");
    }
    if let Ok(v) = std::env::var("INCREMENTUM_STATE_DIR") {
        cfg.state_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("INCREMENTUM_EVENTS_DIR") {
        cfg.events_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("INCREMENTUM_MAX_TEST_RETRIES") {
        if let Ok(v) = v.parse() {
            cfg.max_test_retries = v;
        }
    }
    if let Ok(v) = std::env::var("INCREMENTUM_MAX_REVIEW_ITERATIONS") {
        if let Ok(v) = v.parse() {
            cfg.max_review_iterations = v;
        }
    }
    if let Ok(v) = std::env::var("INCREMENTUM_AGENT_BINARY") {
        cfg.agent_binary = v;
    }
    if let Ok(v) = std::env::var("INCREMENTUM_VCS_BINARY") {
        cfg.vcs_binary = v;
    }
    if let Ok(v) = std::env::var("INCREMENTUM_TEST_COMMAND") {
        cfg.default_test_command = v;
    }
}

fn apply_override(cfg: &mut Config, o: ConfigOverride) {
    if let Some(v) = o.state_dir {
        cfg.state_dir = v;
    }
    if let Some(v) = o.events_dir {
        cfg.events_dir = v;
    }
    if let Some(v) = o.max_test_retries {
        cfg.max_test_retries = v;
    }
    if let Some(v) = o.max_review_iterations {
        cfg.max_review_iterations = v;
    }
    if let Some(v) = o.agent_binary {
        cfg.agent_binary = v;
    }
    if let Some(v) = o.vcs_binary {
        cfg.vcs_binary = v;
    }
    if let Some(v) = o.default_test_command {
        cfg.default_test_command = v;
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
