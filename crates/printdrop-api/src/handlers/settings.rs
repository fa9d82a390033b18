//! Settings view

use crate::state::AppState;
use axum::{extract::State, Json};
use printdrop_core::{PipelineConfig, Settings};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    /// Settings as stored, or `None` when the file cannot be read.
    pub stored: Option<Settings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
    /// Values the pipeline actually uses after validation.
    pub effective: PipelineConfig,
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    let (stored, load_error) = match state.coordinator.config_provider().load().await {
        Ok(settings) => (Some(settings), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let effective = state.coordinator.snapshot().await;

    Json(SettingsResponse {
        stored,
        load_error,
        effective,
    })
}
