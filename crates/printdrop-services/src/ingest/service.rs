//! Ingestion service
//!
//! Commits uploaded photos into the pipeline. Each accepted file is written
//! once, fully flushed, into Backup; Staging receives a copy of those bytes.
//! Neither step takes the pipeline gate: a file only appears in Staging once
//! it is complete, so a concurrent release never sees a partial photo.

use std::sync::Arc;
use std::time::{Duration, Instant};

use printdrop_core::{AppError, Stage};
use printdrop_storage::{generate_identity, LocalStageStore, StageStore, StorageError};
use printdrop_worker::{PipelineCoordinator, ReleaseTrigger};
use thiserror::Error;

use super::types::{IngestReport, UploadedFile};
use super::validator::{UploadValidator, ValidationError};

/// Why a single file could not be ingested
#[derive(Debug, Error)]
pub enum IngestFailure {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No files were uploaded")]
    NoFiles,

    #[error("Stage directories unavailable: {0}")]
    Unavailable(#[source] StorageError),

    /// Processing stopped at `filename`. Files before it stay committed.
    #[error("Upload of {filename} failed: {cause}")]
    Rejected {
        filename: String,
        accepted: Vec<String>,
        #[source]
        cause: IngestFailure,
    },
}

impl IngestError {
    /// Identities committed before the request failed.
    pub fn accepted(&self) -> &[String] {
        match self {
            IngestError::Rejected { accepted, .. } => accepted,
            _ => &[],
        }
    }
}

impl From<IngestFailure> for AppError {
    fn from(failure: IngestFailure) -> Self {
        match failure {
            IngestFailure::Invalid(e @ ValidationError::UnsupportedType { .. }) => {
                AppError::UnsupportedType(e.to_string())
            }
            IngestFailure::Invalid(e @ ValidationError::TooLarge { .. }) => {
                AppError::PayloadTooLarge(e.to_string())
            }
            IngestFailure::Invalid(e @ ValidationError::EmptyFile) => {
                AppError::InvalidInput(e.to_string())
            }
            IngestFailure::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NoFiles => AppError::InvalidInput(IngestError::NoFiles.to_string()),
            IngestError::Unavailable(e) => AppError::Storage(e.to_string()),
            IngestError::Rejected {
                filename,
                accepted,
                cause,
            } => AppError::UploadRejected {
                file: filename,
                accepted,
                source: Box::new(cause.into()),
            },
        }
    }
}

pub struct IngestionService {
    coordinator: Arc<PipelineCoordinator>,
    trigger: Arc<dyn ReleaseTrigger>,
    validator: UploadValidator,
}

impl IngestionService {
    pub fn new(coordinator: Arc<PipelineCoordinator>, trigger: Arc<dyn ReleaseTrigger>) -> Self {
        Self {
            coordinator,
            trigger,
            validator: UploadValidator::default(),
        }
    }

    /// Ingest one upload request, stopping at the first file that fails.
    ///
    /// When at least one file was committed, a single delayed release is
    /// requested, delayed by the current release interval.
    #[tracing::instrument(skip(self, files), fields(files = files.len()))]
    pub async fn ingest_batch(
        &self,
        files: Vec<UploadedFile>,
    ) -> Result<IngestReport, IngestError> {
        if files.is_empty() {
            return Err(IngestError::NoFiles);
        }

        let config = self.coordinator.snapshot().await;
        let store = LocalStageStore::new(config.paths);
        store
            .ensure_directories()
            .await
            .map_err(IngestError::Unavailable)?;

        let mut accepted = Vec::with_capacity(files.len());
        for file in &files {
            match self.ingest_one(&store, file).await {
                Ok(identity) => accepted.push(identity),
                Err(cause) => {
                    tracing::warn!(
                        filename = %file.filename,
                        error = %cause,
                        accepted = accepted.len(),
                        "Upload rejected"
                    );
                    self.request_release(&accepted, config.release_interval);
                    return Err(IngestError::Rejected {
                        filename: file.filename.clone(),
                        accepted,
                        cause,
                    });
                }
            }
        }

        self.request_release(&accepted, config.release_interval);
        Ok(IngestReport { accepted })
    }

    /// Validate and commit one file, returning its identity.
    ///
    /// Nothing is written for a file that fails validation.
    pub async fn ingest_one(
        &self,
        store: &dyn StageStore,
        file: &UploadedFile,
    ) -> Result<String, IngestFailure> {
        let content_type = self
            .validator
            .validate(&file.content_type, file.size_bytes())?;

        let start = Instant::now();
        let identity = generate_identity(&file.filename, &content_type);

        store.put(Stage::Backup, &identity, &file.data).await?;
        if let Err(e) = store.copy_to(Stage::Backup, Stage::Staging, &identity).await {
            tracing::error!(
                identity = %identity,
                error = %e,
                "Photo kept in backup but could not be staged"
            );
            return Err(e.into());
        }

        tracing::info!(
            identity = %identity,
            filename = %file.filename,
            content_type = %content_type,
            size_bytes = file.size_bytes(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Photo ingested"
        );

        Ok(identity)
    }

    fn request_release(&self, accepted: &[String], delay: Duration) {
        if !accepted.is_empty() {
            self.trigger.request_release(delay);
        }
    }
}
