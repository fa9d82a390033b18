//! Server startup and graceful shutdown

use crate::constants::SCHEDULER_SHUTDOWN_TIMEOUT_SECS;
use crate::setup::Application;
use anyhow::Result;
use printdrop_core::ServerConfig;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Start the server with graceful shutdown
///
/// On Ctrl+C or SIGTERM the release loop and pending delayed releases are
/// cancelled right away and the server drains open connections. Any release
/// batch already in flight is then given time to finish.
pub async fn start_server(config: &ServerConfig, app: Application) -> Result<()> {
    let Application {
        state,
        router,
        shutdown,
    } = app;

    let addr = format!("{}:{}", config.bind_addr, config.port);
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        data_root = %config.data_root.display(),
        settings = %config.settings_path.display(),
        environment = %config.environment,
        "Server ready and accepting connections"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // Covers the periodic loop and post-upload releases alike.
    match tokio::time::timeout(
        Duration::from_secs(SCHEDULER_SHUTDOWN_TIMEOUT_SECS),
        state.scheduler.shutdown(),
    )
    .await
    {
        Ok(()) => tracing::info!("Release tasks finished"),
        Err(_) => tracing::warn!("Release tasks did not finish in time"),
    }

    Ok(())
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM signals to initiate graceful shutdown.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
        _ = shutdown.cancelled() => {},
    }

    tracing::info!("Shutting down gracefully...");
    shutdown.cancel();
}
