use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use build_grid::config::Config;
use build_grid::github::OctocrabClient;
use build_grid::scheduler::{Clock, Scheduler, SystemClock};
use build_grid::server::{AppState, build_router};
use build_grid::window::WindowSet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "build_grid=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = Config::path_from_env();
    let config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let clock = SystemClock;
    let windows = WindowSet::new(config.repos.clone(), config.day_history, clock.today())
        .context("building day windows")?;
    let windows = Arc::new(RwLock::new(windows));

    let provider =
        OctocrabClient::from_token(config.github_token.clone()).context("building GitHub client")?;
    let store = config.store.open().context("opening snapshot store")?;
    info!(
        store = store.kind(),
        repos = config.repos.len(),
        days = config.day_history,
        "Starting build grid"
    );

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&windows),
        provider,
        store,
        clock,
        config.scheduler.clone(),
    ));
    scheduler.restore().await;
    scheduler.poll_once().await;

    let shutdown = CancellationToken::new();
    let scheduler_task = {
        let scheduler = Arc::clone(&scheduler);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "Listening");

    let app = build_router(AppState::new(windows));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal(shutdown.clone()))
        .await;

    // The server may also stop on an I/O error; the scheduler still flushes.
    shutdown.cancel();
    scheduler_task.await.context("scheduler task panicked")?;
    served.context("serving HTTP")?;

    info!("Shut down cleanly");
    Ok(())
}

/// Waits for SIGINT or SIGTERM, then cancels `shutdown`.
async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = sigterm.recv() => info!(signal = "SIGTERM", "Shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM; only Ctrl-C will stop the server");
                ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c().await;
    }

    shutdown.cancel();
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if !ctrl_c_received(tokio::signal::ctrl_c().await) {
        std::future::pending::<()>().await;
    }
}

fn ctrl_c_received(result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => {
            info!(signal = "SIGINT", "Shutting down");
            true
        }
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            false
        }
    }
}
