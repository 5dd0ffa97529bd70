// SPDX-License-Identifier: MIT

//! The swarm server (spec.md §4.7): binds a localhost TCP port resolved
//! per-repo, accepts connections, and dispatches Do/Kill/Tail/Logs/List.
//! Each accepted connection is handled in its own spawned task (spec.md
//! §4.7 "Concurrency. Each RPC runs in its own task"), so a slow Tail
//! subscriber never blocks a later Kill.

use crate::error::Result;
use crate::protocol::{self, DoParams, JobIdParams, ListParams, Method, Response, RpcError, TailFrame};
use incrementum_core::{JobStatus, RepoSlug};
use incrementum_engine::{EventBus, JobLifecycleEvent, JobMachine, RunOptions, SessionRegistry, TodoSource};
use incrementum_storage::StateStore;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Swarm addresses are hashed into this range rather than the dynamic
/// port range, so a minted port never collides with an ephemeral client
/// socket on the same host.
const PORT_RANGE_START: u32 = 20_000;
const PORT_RANGE_LEN: u32 = 20_000;

fn hash_port(repo_slug: &str) -> u16 {
    let mut hash: u32 = 0x811c_9dc5;
    for b in repo_slug.as_bytes() {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    (PORT_RANGE_START + hash % PORT_RANGE_LEN) as u16
}

/// `ResolveAddr` (spec.md §4.7): an explicit override wins; otherwise the
/// port is looked up or minted and durably recorded from the repo slug, so
/// later invocations against the same repo find the same port.
pub async fn resolve_addr(store: &StateStore, repo_slug: &RepoSlug, override_port: Option<u16>) -> incrementum_storage::Result<SocketAddr> {
    let port = match override_port {
        Some(p) => p,
        None => {
            let slug = repo_slug.as_str().to_string();
            store.mutate(move |state| *state.swarm_ports.entry(slug.clone()).or_insert_with(|| hash_port(&slug))).await?
        }
    };
    Ok(SocketAddr::from(([127, 0, 0, 1], port)))
}

/// 0.0.0.0 is substituted for an unspecified host in the startup log line
/// only (spec.md §4.7); the bound address itself is unaffected.
fn log_addr(addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        SocketAddr::from(([0, 0, 0, 0], addr.port()))
    } else {
        addr
    }
}

pub struct ServerContext {
    pub store: Arc<StateStore>,
    pub job_machine: Arc<JobMachine>,
    pub sessions: Arc<SessionRegistry>,
    pub events: Arc<EventBus>,
    pub todos: Arc<dyn TodoSource>,
    pub repo_root: PathBuf,
    pub repo_slug: RepoSlug,
}

type ActiveCancels = Arc<Mutex<HashMap<String, CancellationToken>>>;

pub struct Server {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    active_cancels: ActiveCancels,
}

impl Server {
    pub async fn bind(addr: SocketAddr, ctx: ServerContext) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %log_addr(addr), "swarm server listening");
        Ok(Self { listener, ctx: Arc::new(ctx), active_cancels: Arc::new(Mutex::new(HashMap::new())) })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("swarm server shutting down");
                    return;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            tracing::debug!(%peer, "swarm connection accepted");
                            let ctx = Arc::clone(&self.ctx);
                            let active_cancels = Arc::clone(&self.active_cancels);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, ctx, active_cancels).await {
                                    tracing::warn!(error = %e, "swarm connection ended with an error");
                                }
                            });
                        }
                        Err(e) => tracing::warn!(error = %e, "swarm accept error"),
                    }
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, ctx: Arc<ServerContext>, active_cancels: ActiveCancels) -> Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    let request = protocol::read_request(&mut reader).await?;
    let id = request.id.clone();

    match request.method {
        Method::Do => {
            let params: DoParams = serde_json::from_value(request.params)?;
            let result = handle_do(&ctx, &active_cancels, params.todo_id).await;
            protocol::write_response(&mut writer, &to_response(id, result)).await?;
        }
        Method::Kill => {
            let params: JobIdParams = serde_json::from_value(request.params)?;
            let result = handle_kill(&ctx, &active_cancels, params.job_id).await.map(|()| serde_json::json!({"ok": true}));
            protocol::write_response(&mut writer, &to_response(id, result)).await?;
        }
        Method::Tail => {
            let params: JobIdParams = serde_json::from_value(request.params)?;
            handle_tail(&ctx, &mut writer, id, params.job_id).await?;
        }
        Method::Logs => {
            let params: JobIdParams = serde_json::from_value(request.params)?;
            let result = handle_logs(&ctx, params.job_id).await;
            protocol::write_response(&mut writer, &to_response(id, result)).await?;
        }
        Method::List => {
            let params: ListParams = serde_json::from_value(request.params)?;
            let result = handle_list(&ctx, params.include_all).await;
            protocol::write_response(&mut writer, &to_response(id, result)).await?;
        }
    }
    Ok(())
}

fn to_response(id: String, result: std::result::Result<serde_json::Value, RpcError>) -> Response {
    match result {
        Ok(value) => Response::ok(id, value),
        Err(e) => Response::err(id, e),
    }
}

/// Learns the job id synchronously from the `Started` lifecycle event
/// while the run itself continues in a spawned background task, so `Do`
/// doesn't block the RPC caller for the whole pipeline.
async fn handle_do(ctx: &ServerContext, active_cancels: &ActiveCancels, todo_id: String) -> std::result::Result<serde_json::Value, RpcError> {
    let todos = ctx.todos.list().await.map_err(|e| RpcError::Internal { message: e.to_string() })?;
    let todo = todos.into_iter().find(|t| t.id == todo_id).ok_or(RpcError::TodoNotFound { todo_id })?;

    let (lifecycle_tx, mut lifecycle_rx) = mpsc::channel(8);
    let (event_tx, event_rx) = mpsc::channel(256);
    let cancel = CancellationToken::new();
    let options = RunOptions { lifecycle_tx: Some(lifecycle_tx), event_tx: Some(event_tx), cancel: cancel.clone(), ..Default::default() };

    let events = Arc::clone(&ctx.events);
    let repo_slug = ctx.repo_slug.clone();
    tokio::spawn(async move {
        if let Err(e) = events.run(&repo_slug, event_rx, None).await {
            tracing::warn!(error = %e, "event bus run ended with an error");
        }
    });

    let job_machine = Arc::clone(&ctx.job_machine);
    let repo_root = ctx.repo_root.clone();
    let handle = tokio::spawn(async move { job_machine.run(&repo_root, &todo.id, &todo.description, options).await });

    match lifecycle_rx.recv().await {
        Some(JobLifecycleEvent::Started { job_id }) => {
            active_cancels.lock().await.insert(job_id.clone(), cancel);
            let active_cancels = Arc::clone(active_cancels);
            let cleanup_job_id = job_id.clone();
            tokio::spawn(async move {
                let _ = handle.await;
                active_cancels.lock().await.remove(&cleanup_job_id);
            });
            Ok(serde_json::json!({ "job_id": job_id }))
        }
        _ => {
            handle.abort();
            Err(RpcError::WorkspaceUnavailable { reason: "job failed to start before reporting its id".to_string() })
        }
    }
}

/// Idempotent per spec.md §4.7: a job that has already reached a terminal
/// status errors `JobNotActive` rather than silently succeeding twice, but
/// cancelling a still-active job never corrupts state regardless of how
/// many times it's requested.
async fn handle_kill(ctx: &ServerContext, active_cancels: &ActiveCancels, job_id: String) -> std::result::Result<(), RpcError> {
    let state = ctx.store.read().await.map_err(|e| RpcError::Internal { message: e.to_string() })?;
    let job = state.find_job(&job_id).cloned().ok_or(RpcError::JobNotFound { job_id: job_id.clone() })?;
    drop(state);

    if job.status != JobStatus::Active {
        return Err(RpcError::JobNotActive { job_id });
    }

    if let Some(token) = active_cancels.lock().await.get(job.id.as_str()) {
        token.cancel();
    }

    for session_ref in &job.sessions {
        if let Ok(session) = ctx.sessions.find_session(&job.repo_slug, &session_ref.session_id).await {
            if !session.status.is_terminal() {
                let _ = ctx.sessions.kill(job.repo_slug.clone(), session.id).await;
            }
        }
    }
    Ok(())
}

/// Streams matching events until the bus's subscriber registry for this
/// repo closes; because [`EventBus`] keys subscribers per-repo rather than
/// per-job, a Tail outlives its own job if another run against the same
/// repo is still in flight, and ends once the last one does.
async fn handle_tail<W: tokio::io::AsyncWrite + Unpin>(ctx: &ServerContext, writer: &mut W, id: String, job_id: String) -> Result<()> {
    let state = ctx.store.read().await?;
    let Some(job) = state.find_job(&job_id) else {
        protocol::write_response(writer, &Response::err(id, RpcError::JobNotFound { job_id })).await?;
        return Ok(());
    };
    let canonical_job_id = job.id.as_str().to_string();
    let session_ids: HashSet<String> = job.sessions.iter().map(|s| s.session_id.clone()).collect();
    drop(state);

    let mut rx = ctx.events.subscribe(&ctx.repo_slug).await;
    while let Some(event) = rx.recv().await {
        if event.entity_id == canonical_job_id || session_ids.contains(&event.entity_id) {
            protocol::write_tail_frame(writer, &TailFrame::event(id.clone(), event)).await?;
        }
    }
    protocol::write_tail_frame(writer, &TailFrame::done(id)).await?;
    Ok(())
}

async fn handle_logs(ctx: &ServerContext, job_id: String) -> std::result::Result<serde_json::Value, RpcError> {
    let state = ctx.store.read().await.map_err(|e| RpcError::Internal { message: e.to_string() })?;
    let job = state.find_job(&job_id).cloned().ok_or(RpcError::JobNotFound { job_id: job_id.clone() })?;
    drop(state);

    let canonical_job_id = job.id.as_str().to_string();
    let session_ids: HashSet<String> = job.sessions.iter().map(|s| s.session_id.clone()).collect();
    let events = ctx.events.historical(&ctx.repo_slug).await.map_err(|e| RpcError::Internal { message: e.to_string() })?;
    let filtered: Vec<_> = events.into_iter().filter(|e| e.entity_id == canonical_job_id || session_ids.contains(&e.entity_id)).collect();
    serde_json::to_value(filtered).map_err(|e| RpcError::Internal { message: e.to_string() })
}

async fn handle_list(ctx: &ServerContext, include_all: bool) -> std::result::Result<serde_json::Value, RpcError> {
    let state = ctx.store.read().await.map_err(|e| RpcError::Internal { message: e.to_string() })?;
    let mut jobs: Vec<_> = state.jobs.values().filter(|j| j.repo_slug == ctx.repo_slug && (include_all || j.status == JobStatus::Active)).cloned().collect();
    jobs.sort_by_key(|j| j.started_at);
    serde_json::to_value(jobs).map_err(|e| RpcError::Internal { message: e.to_string() })
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
