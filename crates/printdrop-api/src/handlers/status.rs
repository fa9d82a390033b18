//! Pipeline status

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use printdrop_core::{PipelineConfig, PipelinePhase, Stage};
use printdrop_storage::StageStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub title: String,
    pub phase: PipelinePhase,
    pub staging_count: usize,
    pub print_queue_count: usize,
    pub backup_count: usize,
    /// Photos moved to the print queue since startup.
    pub total_released: u64,
    /// Photos seen in Staging by the last release attempt.
    pub last_staging_count: usize,
    pub config: PipelineConfig,
}

/// Current pipeline state. Reads directories without taking the release gate.
pub async fn pipeline_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, HttpAppError> {
    let (config, store) = state.stage_store().await;

    let staging_count = store.list_ordered_by_arrival(Stage::Staging).await?.len();
    let print_queue_count = store.list_ordered_by_arrival(Stage::PrintQueue).await?.len();
    let backup_count = store.list_ordered_by_arrival(Stage::Backup).await?.len();

    Ok(Json(StatusResponse {
        title: config.title.clone(),
        phase: state.coordinator.phase(),
        staging_count,
        print_queue_count,
        backup_count,
        total_released: state.coordinator.total_released(),
        last_staging_count: state.coordinator.last_staging_count(),
        config,
    }))
}
