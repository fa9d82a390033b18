//! Backup listing and archive download

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use printdrop_core::PhotoFile;
use printdrop_services::{create_backup_archive, list_backup_photos, BACKUP_ARCHIVE_NAME};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct BackupListResponse {
    pub count: usize,
    /// Newest first.
    pub photos: Vec<PhotoFile>,
}

pub async fn list_backup(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BackupListResponse>, HttpAppError> {
    let (_, store) = state.stage_store().await;
    let photos = list_backup_photos(&store).await?;

    Ok(Json(BackupListResponse {
        count: photos.len(),
        photos,
    }))
}

/// ZIP of every backup photo.
#[tracing::instrument(skip(state))]
pub async fn download_backup_archive(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (_, store) = state.stage_store().await;
    let archive = create_backup_archive(&store).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", BACKUP_ARCHIVE_NAME),
            ),
        ],
        archive,
    ))
}
