//! Convene entry point.
//!
//! Binary name: `convene`
//!
//! Parses configuration, initializes tracing, wires the services over the
//! selected repository backend, and runs the update loop alongside an HTTP
//! health endpoint until Ctrl+C or SIGTERM.

mod config;
mod console;
mod http;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use convene_core::dialog::DialogManager;
use convene_core::dispatch::{self, DEFAULT_DRAIN_GRACE};
use convene_core::meeting::MeetingService;
use convene_core::reminder::ReminderScheduler;
use convene_core::repository::{MeetingRepository, UserRepository, VoteRepository};
use convene_core::router::UpdateRouter;
use convene_core::voting::VoteService;
use convene_infra::memory::{
    InMemoryMeetingRepository, InMemoryUserRepository, InMemoryVoteRepository,
};
use convene_infra::sqlite::{
    DatabasePool, SqliteMeetingRepository, SqliteUserRepository, SqliteVoteRepository,
};
use convene_observe::tracing_setup::{self, LogFormat};

use config::Config;
use console::ConsoleTransport;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let format = if config.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    tracing_setup::init_tracing(config.enable_otel, format)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    info!(
        port = config.port,
        voting_duration = config.voting_duration,
        "configuration loaded"
    );
    debug!(token_len = config.bot_token.len(), "bot token present");

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    // Health endpoint runs beside the bot loop.
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "health endpoint listening");
    let http_shutdown = shutdown.clone();
    let http_server = tokio::spawn(async move {
        axum::serve(listener, http::build_router())
            .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
            .await
    });

    match &config.database_url {
        Some(url) => {
            info!("using SQLite backend");
            let pool = DatabasePool::new(url).await?;
            run_bot(
                SqliteMeetingRepository::new(pool.clone()),
                SqliteUserRepository::new(pool.clone()),
                SqliteVoteRepository::new(pool),
                shutdown.clone(),
            )
            .await;
        }
        None => {
            info!("no DATABASE_URL, using in-memory backend");
            run_bot(
                InMemoryMeetingRepository::new(),
                InMemoryUserRepository::new(),
                InMemoryVoteRepository::new(),
                shutdown.clone(),
            )
            .await;
        }
    }

    shutdown.cancel();
    http_server.await??;
    tracing_setup::shutdown_tracing();
    info!("shut down cleanly");
    Ok(())
}

/// Wire the services over a repository backend and run the update loop until
/// shutdown.
async fn run_bot<M, U, V>(meeting_repo: M, user_repo: U, vote_repo: V, shutdown: CancellationToken)
where
    M: MeetingRepository + Clone + 'static,
    U: UserRepository + 'static,
    V: VoteRepository + 'static,
{
    let transport = Arc::new(ConsoleTransport::new());
    let meetings = Arc::new(MeetingService::new(meeting_repo.clone(), user_repo));
    let voting = Arc::new(VoteService::new(vote_repo, meeting_repo));
    let dialogs = Arc::new(DialogManager::new(Arc::clone(&meetings)));
    let reminders = Arc::new(ReminderScheduler::new(Arc::clone(&transport)));
    let router = Arc::new(UpdateRouter::new(
        meetings,
        voting,
        Arc::clone(&dialogs),
        Arc::clone(&reminders),
        transport,
    ));

    spawn_session_sweeper(dialogs, shutdown.clone());

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(console::read_stdin_events(tx, shutdown.clone()));

    info!("update loop running, type /help");
    dispatch::run_update_loop(router, rx, shutdown, DEFAULT_DRAIN_GRACE).await;

    // Pending reminder tasks must not outlive the loop.
    reminders.shutdown();
}

/// Drop idle dialog sessions on a fixed interval.
fn spawn_session_sweeper<M, U>(dialogs: Arc<DialogManager<M, U>>, shutdown: CancellationToken)
where
    M: MeetingRepository + 'static,
    U: UserRepository + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    dialogs.sweep_idle();
                }
            }
        }
    });
}

/// Wait for Ctrl+C or SIGTERM and cancel the shutdown token.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received Ctrl+C"),
            _ = terminate => info!("received SIGTERM"),
        }
        shutdown.cancel();
    });
}
