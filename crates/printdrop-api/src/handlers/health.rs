//! Health check handler

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use printdrop_core::Stage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub storage: String,
}

/// Healthy when every stage directory can be reached.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (config, _) = state.stage_store().await;

    let check = async {
        for stage in Stage::ALL {
            let dir = config.paths.dir(stage);
            if !tokio::fs::try_exists(dir).await? {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} directory missing", stage),
                ));
            }
        }
        Ok::<(), std::io::Error>(())
    };

    let storage = match tokio::time::timeout(CHECK_TIMEOUT, check).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Stage directory check failed");
            format!("degraded: {}", e)
        }
        Err(_) => "timeout".to_string(),
    };

    let healthy = storage == "healthy";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthCheckResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            storage,
        }),
    )
}
