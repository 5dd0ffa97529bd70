// SPDX-License-Identifier: MIT

//! Spawning and readiness-polling the coding agent process (spec.md §4.2):
//! start a `serve` subprocess bound to an ephemeral port, wait for its
//! `/event` SSE endpoint to accept a connection, then start an attached
//! `run` subprocess fed the prompt on stdin. Teardown signals `serve` with
//! interrupt, waits up to 2 seconds, then kills it.

use crate::error::{AdapterError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Child;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct AgentProcessConfig {
    pub agent_binary: String,
    pub workspace_path: PathBuf,
    pub prompt: String,
    pub port: u16,
    pub env: Vec<(String, String)>,
}

/// The terminal outcome of an agent process: its exit code and whatever it
/// wrote to stdout, which carries the assistant's final transcript text
/// when the agent binary is run non-interactively.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub exit_code: i32,
    pub stdout: String,
}

/// A live agent process pair: the `serve` child (held so teardown can
/// signal it) and a shutdown handle that tells the event bridge following
/// `run`'s output to stop early.
pub struct AgentHandle {
    pub port: u16,
    serve_child: Option<Child>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    exit_rx: oneshot::Receiver<AgentOutcome>,
}

impl AgentHandle {
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Signal the event bridge following this agent to stop.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the `run` subprocess to exit, then tear down `serve`
    /// (interrupt, wait up to 2s, kill — spec.md §4.2). Returns `None` if
    /// the reaper task was dropped without observing an exit.
    pub async fn wait(mut self) -> Option<AgentOutcome> {
        let outcome = self.exit_rx.await.ok();
        self.teardown_serve().await;
        outcome
    }

    async fn teardown_serve(&mut self) {
        let Some(mut child) = self.serve_child.take() else { return };
        let Some(pid) = child.id() else { return };

        let target = nix::unistd::Pid::from_raw(pid as i32);
        if let Err(e) = nix::sys::signal::kill(target, nix::sys::signal::Signal::SIGINT) {
            tracing::warn!(pid, error = %e, "failed to interrupt serve subprocess");
        }

        match tokio::time::timeout(Duration::from_secs(2), child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(pid, %status, "serve subprocess exited after interrupt"),
            Ok(Err(e)) => tracing::warn!(pid, error = %e, "error waiting on serve subprocess"),
            Err(_) => {
                tracing::warn!(pid, "serve subprocess did not exit within 2s of interrupt, killing");
                if let Err(e) = child.kill().await {
                    tracing::warn!(pid, error = %e, "failed to kill serve subprocess");
                }
            }
        }
    }
}

/// Spawn `<agent_binary> serve --port <p> --hostname <h>`, wait for
/// `/event` to accept a GET, then spawn an attached
/// `<agent_binary> run --attach <url>` with the prompt delivered on stdin
/// (spec.md §4.2).
pub async fn spawn(config: AgentProcessConfig, ready_timeout: Duration) -> Result<(AgentHandle, oneshot::Receiver<()>)> {
    if !config.workspace_path.exists() {
        return Err(AdapterError::Workspace(format!(
            "workspace does not exist: {}",
            config.workspace_path.display()
        )));
    }

    let mut serve_cmd = tokio::process::Command::new(&config.agent_binary);
    serve_cmd
        .arg("serve")
        .arg("--port")
        .arg(config.port.to_string())
        .arg("--hostname")
        .arg("127.0.0.1")
        .current_dir(&config.workspace_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());
    for (key, value) in &config.env {
        serve_cmd.env(key, value);
    }

    let mut serve_child = serve_cmd
        .spawn()
        .map_err(|e| AdapterError::SpawnFailed(format!("failed to spawn {} serve: {e}", config.agent_binary)))?;

    drain_pipe(serve_child.stdout.take());
    drain_pipe(serve_child.stderr.take());

    if let Err(e) = wait_for_ready(config.port, ready_timeout).await {
        let _ = serve_child.start_kill();
        return Err(e);
    }

    let attach_url = format!("http://127.0.0.1:{}/event", config.port);
    let mut run_cmd = tokio::process::Command::new(&config.agent_binary);
    run_cmd
        .arg("run")
        .arg("--attach")
        .arg(&attach_url)
        .current_dir(&config.workspace_path)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());
    for (key, value) in &config.env {
        run_cmd.env(key, value);
    }

    let mut run_child = run_cmd
        .spawn()
        .map_err(|e| AdapterError::SpawnFailed(format!("failed to spawn {} run: {e}", config.agent_binary)))?;

    if let Some(mut stdin) = run_child.stdin.take() {
        let prompt = config.prompt.clone();
        tokio::spawn(async move {
            let _ = stdin.write_all(prompt.as_bytes()).await;
            let _ = stdin.shutdown().await;
        });
    }

    let agent_binary = config.agent_binary.clone();
    let (exit_tx, exit_rx) = oneshot::channel();
    tokio::spawn(async move {
        match run_child.wait_with_output().await {
            Ok(output) => {
                tracing::info!(
                    agent_binary = %agent_binary,
                    exit_status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "agent run subprocess exited"
                );
                let outcome = AgentOutcome {
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                };
                let _ = exit_tx.send(outcome);
            }
            Err(e) => {
                tracing::error!(agent_binary = %agent_binary, error = %e, "failed to wait on agent run subprocess");
            }
        }
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    Ok((
        AgentHandle { port: config.port, serve_child: Some(serve_child), shutdown_tx: Some(shutdown_tx), exit_rx },
        shutdown_rx,
    ))
}

/// Discards a piped child stream so it never backs up and stalls the
/// process; the transcript we care about comes from the `run` subprocess,
/// not `serve`.
fn drain_pipe<R>(pipe: Option<R>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    if let Some(mut pipe) = pipe {
        tokio::spawn(async move {
            let mut sink = tokio::io::sink();
            let _ = tokio::io::copy(&mut pipe, &mut sink).await;
        });
    }
}

/// Poll `/event` until it accepts a GET (spec.md §4.2), or until
/// `timeout` elapses.
async fn wait_for_ready(port: u16, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{port}/event");
    let poll_interval = Duration::from_millis(50);
    let deadline = tokio::time::Instant::now() + timeout;

    let mut attempt = 0;
    loop {
        if client.get(&url).send().await.map(|r| r.status().is_success()).unwrap_or(false) {
            tracing::info!(port, attempt, "agent event stream ready");
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(AdapterError::NotReady(timeout));
        }
        tokio::time::sleep(poll_interval).await;
        attempt += 1;
    }
}

/// Find a workspace root suitable for spawning into: it must exist and be
/// a directory, not merely a path that resolves.
pub fn validate_workspace(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(AdapterError::Workspace(format!("not a directory: {}", path.display())));
    }
    Ok(())
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
