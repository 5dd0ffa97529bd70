// SPDX-License-Identifier: MIT

//! The thin CLI (spec.md §6 "CLI surface"): `swarm serve|do|kill|tail|logs|list`
//! and `habit run`, calling straight into `incrementum-daemon`'s client/server
//! and `incrementum-engine`'s `run_habit`. Everything else (todo management,
//! runbooks, table formatting) is out of scope here.

mod todo_store;

use clap::{Parser, Subcommand};
use incrementum_core::Config;
use incrementum_daemon::{resolve_addr, Client, Server, ServerContext};
use incrementum_engine::{EventBus, JobMachine, RunOptions, SessionRegistry, WorkspacePool};
use incrementum_storage::StateStore;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use todo_store::JsonTodoSource;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Daemon(#[from] incrementum_daemon::DaemonError),
    #[error(transparent)]
    Engine(#[from] incrementum_engine::EngineError),
    #[error(transparent)]
    Habit(#[from] incrementum_habits::HabitError),
    #[error(transparent)]
    Storage(#[from] incrementum_storage::StorageError),
    #[error(transparent)]
    Core(#[from] incrementum_core::Error),
}

impl CliError {
    /// The agent's own exit code, when one was observed (spec.md §6: "0 on
    /// success; the agent's exit code when one was observed; 1 otherwise").
    fn exit_code(&self) -> Option<i32> {
        match self {
            CliError::Engine(incrementum_engine::EngineError::External { exit_code, .. }) => *exit_code,
            _ => None,
        }
    }
}

#[derive(Parser)]
#[command(name = "incrementum", about = "Incremental-development orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Swarm RPC server and client commands.
    #[command(subcommand)]
    Swarm(SwarmCommand),
    /// Run a habit directly, without a swarm server.
    #[command(subcommand)]
    Habit(HabitCommand),
}

#[derive(Subcommand)]
enum SwarmCommand {
    /// Start the swarm RPC server for a repo.
    Serve {
        repo: PathBuf,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Drive a todo through the pipeline; prints the new job id.
    Do {
        repo: PathBuf,
        todo_id: String,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Cancel a job and kill its live agent sessions.
    Kill {
        repo: PathBuf,
        job_id: String,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Stream a job's events until it finishes.
    Tail {
        repo: PathBuf,
        job_id: String,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print a job's historical event log.
    Logs {
        repo: PathBuf,
        job_id: String,
        #[arg(long)]
        port: Option<u16>,
    },
    /// List jobs for a repo.
    List {
        repo: PathBuf,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum HabitCommand {
    /// Run a named habit directly, bypassing the swarm server entirely.
    Run {
        repo: PathBuf,
        name: String,
        #[arg(long)]
        habits_dir: Option<PathBuf>,
    },
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = std::env::var("INCREMENTUM_LOG").or_else(|_| std::env::var("RUST_LOG")).unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(filter)).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            match e.exit_code() {
                Some(code) if (0..=255).contains(&code) => ExitCode::from(code as u8),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Swarm(cmd) => run_swarm(cmd).await,
        Command::Habit(cmd) => run_habit(cmd).await,
    }
}

async fn run_swarm(cmd: SwarmCommand) -> Result<(), CliError> {
    match cmd {
        SwarmCommand::Serve { repo, port } => serve(repo, port).await,
        SwarmCommand::Do { repo, todo_id, port } => {
            let client = connect(&repo, port).await?;
            let job_id = client.do_todo(todo_id).await?;
            println!("{job_id}");
            Ok(())
        }
        SwarmCommand::Kill { repo, job_id, port } => {
            let client = connect(&repo, port).await?;
            client.kill(job_id).await?;
            Ok(())
        }
        SwarmCommand::Tail { repo, job_id, port } => {
            let client = connect(&repo, port).await?;
            client
                .tail(job_id, |event| {
                    println!("{}", serde_json::to_string(&event).unwrap_or_default());
                })
                .await?;
            Ok(())
        }
        SwarmCommand::Logs { repo, job_id, port } => {
            let client = connect(&repo, port).await?;
            for event in client.logs(job_id).await? {
                println!("{}", serde_json::to_string(&event).unwrap_or_default());
            }
            Ok(())
        }
        SwarmCommand::List { repo, all, port } => {
            let client = connect(&repo, port).await?;
            for job in client.list(all).await? {
                println!("{}\t{}\t{}", job.id, job.status, job.todo_id);
            }
            Ok(())
        }
    }
}

async fn connect(repo: &Path, port: Option<u16>) -> Result<Client, CliError> {
    let config = Config::load(None, Default::default())?;
    let store = StateStore::open(&config.state_dir, config.lock_timeout).await?;
    let repo_slug = incrementum_core::sanitize_repo_name(repo);
    let addr = resolve_addr(&store, &repo_slug, port).await?;
    Ok(Client::new(addr))
}

async fn serve(repo: PathBuf, port: Option<u16>) -> Result<(), CliError> {
    let config = Config::load(None, Default::default())?;
    let store = Arc::new(StateStore::open(&config.state_dir, config.lock_timeout).await?);
    let repo_slug = incrementum_core::sanitize_repo_name(&repo);

    let workspaces = Arc::new(WorkspacePool::new(store.clone(), config.vcs_binary.clone(), config.state_dir.join("workspaces")));
    let sessions = Arc::new(SessionRegistry::new(store.clone(), config.agent_binary.clone()));
    let job_machine = Arc::new(JobMachine::new(store.clone(), workspaces, sessions.clone(), config.clone()));
    let events = Arc::new(EventBus::new(config.events_dir.clone()));
    let todos = Arc::new(JsonTodoSource::open(&repo)?);

    let addr = resolve_addr(&store, &repo_slug, port).await?;
    let ctx = ServerContext { store: store.clone(), job_machine, sessions, events, todos, repo_root: repo, repo_slug };
    let server = Server::bind(addr, ctx).await?;

    let shutdown = tokio_util::sync::CancellationToken::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        signal_shutdown.cancel();
    });

    server.run(shutdown).await;
    Ok(())
}

async fn run_habit(cmd: HabitCommand) -> Result<(), CliError> {
    let HabitCommand::Run { repo, name, habits_dir } = cmd;

    let config = Config::load(None, Default::default())?;
    let store = Arc::new(StateStore::open(&config.state_dir, config.lock_timeout).await?);
    let workspaces = Arc::new(WorkspacePool::new(store.clone(), config.vcs_binary.clone(), config.state_dir.join("workspaces")));
    let sessions = Arc::new(SessionRegistry::new(store.clone(), config.agent_binary.clone()));
    let job_machine = JobMachine::new(store, workspaces, sessions, config);

    let habits_dir = habits_dir.unwrap_or_else(|| repo.join(".incrementum").join("habits"));
    let habits = incrementum_habits::HabitRegistry::load(&habits_dir)?;
    let habit = habits.get(&name)?;

    let result = job_machine.run_habit(&repo, &habit.name, &habit.prompt, RunOptions::default()).await?;
    println!("{}\t{}", result.job.id, result.job.status);
    if let Some(spec) = result.new_todo_spec {
        println!("new-todo-spec: {spec}");
    }
    Ok(())
}
