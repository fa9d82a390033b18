//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::Result;
use printdrop_core::ServerConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A fully wired application with its release loop running.
pub struct Application {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    /// Cancels the release loop and pending post-upload releases.
    pub shutdown: CancellationToken,
}

/// Initialize the entire application
pub async fn initialize_app(config: ServerConfig) -> Result<Application> {
    let shutdown = CancellationToken::new();

    // Settings, stage directories and pipeline services
    let state = services::initialize_services(&config, shutdown.clone()).await?;

    // Periodic release loop, tracked by the scheduler for shutdown
    drop(state.scheduler.clone().start());

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok(Application {
        state,
        router,
        shutdown,
    })
}
