// SPDX-License-Identifier: MIT

//! Runs a tokenized command to completion and captures its output
//! (spec.md §4.4 workspace VCS calls, §4.6 test command execution).

use crate::error::{Result, TokenizeError};
use crate::tokenize::tokenize;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Tokenize and run `command` in `cwd`, waiting for it to exit. The first
/// token is the program; no shell is involved, so quoting in `command` is
/// the only thing standing between an argument and word-splitting (no
/// globbing, no variable expansion, no injection via `;`/`&&`/backticks).
pub async fn run(command: &str, cwd: &Path, env: &[(String, String)]) -> Result<CommandOutput> {
    let argv = tokenize(command)?;
    run_argv(&argv, cwd, env).await
}

pub async fn run_argv(argv: &[String], cwd: &Path, env: &[(String, String)]) -> Result<CommandOutput> {
    let (program, args) = argv.split_first().ok_or(TokenizeError::Empty)?;

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let output = cmd.output().await?;
    Ok(CommandOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
