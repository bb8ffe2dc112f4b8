//! taskhub: serve the API, run a worker, or sweep expired results.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use taskhub::config::Settings;
use taskhub::constants::TASK_FLIGHT_PRESELECTION;
use taskhub::executor::registry::HandlerRegistry;
use taskhub::executor::Executor;
use taskhub::gc::Sweeper;
use taskhub::server::{self, AppState};
use taskhub::service::TaskService;
use taskhub::store::memory::{MemoryQueue, MemoryStore};
use taskhub::store::{JobQueue, ResultStore};
use taskhub::tasks::flight::api::FlightOffersClientFactory;
use taskhub::tasks::flight::FlightPreselectionHandler;

/// Asynchronous task-execution hub
#[derive(Parser)]
#[command(name = "taskhub")]
#[command(about = "Asynchronous task-execution hub", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    ///
    /// With the memory backend (local mode) an inline executor worker is
    /// spawned alongside the server, so scheduled tasks actually run.
    Serve {
        /// Bind address, overriding BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },

    /// Poll the jobs queue and execute delivered tasks
    Worker,

    /// Run one garbage-collection sweep over stored results
    Gc,
}

#[cfg(feature = "logging")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();
}

#[cfg(not(feature = "logging"))]
fn init_tracing() {}

struct Backends {
    store: Arc<dyn ResultStore>,
    queue: Arc<dyn JobQueue>,
}

async fn build_backends(settings: &Settings) -> Result<Backends> {
    match settings.store_backend.as_str() {
        "memory" => Ok(Backends {
            store: Arc::new(MemoryStore::new(&settings.jobs_bucket)),
            queue: Arc::new(MemoryQueue::new()),
        }),
        #[cfg(feature = "aws")]
        "s3" => {
            let store = taskhub::store::s3::S3Store::from_env(&settings.jobs_bucket).await;
            let queue = taskhub::store::sqs::SqsQueue::from_env(&settings.jobs_queue_name)
                .await
                .context("resolving SQS queue")?;
            Ok(Backends {
                store: Arc::new(store),
                queue: Arc::new(queue),
            })
        }
        other => bail!(
            "unsupported STORE_BACKEND {other:?} (supported: memory{})",
            if cfg!(feature = "aws") { ", s3" } else { "" }
        ),
    }
}

fn build_registry(settings: &Settings) -> Result<Arc<HandlerRegistry>> {
    let factory = Arc::new(FlightOffersClientFactory::new(
        reqwest::Client::new(),
        settings.search_api(),
    ));
    let handler = FlightPreselectionHandler::new(
        factory,
        settings.fanout_limits(),
        settings.token_settle,
    );
    let mut registry = HandlerRegistry::new();
    registry
        .register(TASK_FLIGHT_PRESELECTION, Arc::new(handler))
        .context("registering built-in handlers")?;
    Ok(Arc::new(registry))
}

async fn serve(settings: Settings, bind: Option<String>) -> Result<()> {
    let settings = Settings {
        bind_addr: bind.unwrap_or(settings.bind_addr.clone()),
        ..settings
    };
    let backends = build_backends(&settings).await?;
    let service = Arc::new(TaskService::new(
        backends.store.clone(),
        backends.queue.clone(),
        settings.results_expire,
    ));

    if settings.inline_executor {
        let registry = build_registry(&settings)?;
        let executor = Executor::new(backends.store.clone(), registry);
        let queue = backends.queue.clone();
        let poll = settings.worker_poll_interval;
        info!("spawning inline executor (local mode)");
        tokio::spawn(async move {
            if let Err(err) = executor.run_loop(queue, poll).await {
                tracing::error!(%err, "inline executor stopped");
            }
        });
    }

    let state = AppState {
        service,
        settings: Arc::new(settings),
    };
    let bind_addr = state.settings.bind_addr.clone();
    info!(%bind_addr, env = %state.settings.env_name, "serving API");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    axum::serve(listener, server::router(state)).await?;
    Ok(())
}

async fn worker(settings: Settings) -> Result<()> {
    let backends = build_backends(&settings).await?;
    let registry = build_registry(&settings)?;
    let executor = Executor::new(backends.store, registry);
    info!(queue = %settings.jobs_queue_name, "worker polling");
    executor
        .run_loop(backends.queue, settings.worker_poll_interval)
        .await?;
    Ok(())
}

async fn gc(settings: Settings) -> Result<()> {
    let backends = build_backends(&settings).await?;
    let sweeper = Sweeper::new(backends.store, settings.results_expire);
    let report = sweeper.run().await?;
    info!(scanned = report.scanned, deleted = report.deleted, "sweep finished");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Commands::Serve { bind } => serve(settings, bind).await,
        Commands::Worker => worker(settings).await,
        Commands::Gc => gc(settings).await,
    }
}
