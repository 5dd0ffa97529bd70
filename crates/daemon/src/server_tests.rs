// SPDX-License-Identifier: MIT

use super::*;
use crate::client::Client;
use crate::error::DaemonError;
use incrementum_core::Config;
use incrementum_engine::todo_source::memory::InMemoryTodoSource;
use incrementum_engine::{EventBus, JobMachine, SessionRegistry, WorkspacePool};
use incrementum_storage::StateStore;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn start_server(dir: &std::path::Path) -> (Client, CancellationToken) {
    let store = Arc::new(StateStore::open(dir, Duration::from_secs(2)).await.unwrap());
    let workspaces = Arc::new(WorkspacePool::new(store.clone(), "true", dir.join("workspaces")));
    let sessions = Arc::new(SessionRegistry::new(store.clone(), "true"));
    let job_machine = Arc::new(JobMachine::new(store.clone(), workspaces, sessions.clone(), Config::default()));
    let events = Arc::new(EventBus::new(dir.join("events")));
    let todos = Arc::new(InMemoryTodoSource::new(Vec::new()));
    let repo_root = dir.join("repo");
    let repo_slug = incrementum_core::sanitize_repo_name(&repo_root);

    let ctx = ServerContext { store, job_machine, sessions, events, todos, repo_root, repo_slug };
    let server = Server::bind(SocketAddr::from(([127, 0, 0, 1], 0)), ctx).await.unwrap();
    let addr = server.local_addr().unwrap();

    let shutdown = CancellationToken::new();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move { server.run(server_shutdown).await });

    (Client::new(addr), shutdown)
}

#[tokio::test]
async fn list_returns_an_empty_array_when_no_jobs_have_run() {
    let dir = tempfile::tempdir().unwrap();
    let (client, shutdown) = start_server(dir.path()).await;

    let jobs = client.list(true).await.unwrap();
    assert!(jobs.is_empty());

    shutdown.cancel();
}

#[tokio::test]
async fn do_with_an_unknown_todo_reports_todo_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (client, shutdown) = start_server(dir.path()).await;

    let err = client.do_todo("does-not-exist").await.unwrap_err();
    assert!(matches!(err, DaemonError::Rpc(RpcError::TodoNotFound { .. })));

    shutdown.cancel();
}

#[tokio::test]
async fn kill_on_an_unknown_job_reports_job_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (client, shutdown) = start_server(dir.path()).await;

    let err = client.kill("job-does-not-exist").await.unwrap_err();
    assert!(matches!(err, DaemonError::Rpc(RpcError::JobNotFound { .. })));

    shutdown.cancel();
}

#[tokio::test]
async fn logs_on_an_unknown_job_reports_job_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (client, shutdown) = start_server(dir.path()).await;

    let err = client.logs("job-does-not-exist").await.unwrap_err();
    assert!(matches!(err, DaemonError::Rpc(RpcError::JobNotFound { .. })));

    shutdown.cancel();
}

#[tokio::test]
async fn resolve_addr_prefers_an_explicit_override() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path(), Duration::from_secs(2)).await.unwrap();
    let repo_slug = incrementum_core::sanitize_repo_name(&dir.path().join("repo"));

    let addr = resolve_addr(&store, &repo_slug, Some(9999)).await.unwrap();
    assert_eq!(addr.port(), 9999);
}

#[tokio::test]
async fn resolve_addr_is_deterministic_and_persists_across_calls() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path(), Duration::from_secs(2)).await.unwrap();
    let repo_slug = incrementum_core::sanitize_repo_name(&dir.path().join("repo"));

    let first = resolve_addr(&store, &repo_slug, None).await.unwrap();
    let second = resolve_addr(&store, &repo_slug, None).await.unwrap();
    assert_eq!(first, second);

    let state = store.read().await.unwrap();
    assert_eq!(state.swarm_ports.get(repo_slug.as_str()), Some(&first.port()));
}
