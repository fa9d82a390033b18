//! Photo upload handler

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_multipart_files;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Identities assigned to the uploaded photos, in upload order.
    pub accepted: Vec<String>,
    pub message: String,
}

/// Accept one or more photos and commit them to Backup and Staging.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_photos(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let files = extract_multipart_files(multipart).await?;
    let report = state.ingestion.ingest_batch(files).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: report.message(),
            accepted: report.accepted,
        }),
    ))
}
