//! Application state shared by every handler.

use printdrop_core::{PipelineConfig, ServerConfig};
use printdrop_services::IngestionService;
use printdrop_storage::LocalStageStore;
use printdrop_worker::{PipelineCoordinator, ReleaseScheduler};
use std::sync::Arc;

pub struct AppState {
    pub config: ServerConfig,
    pub coordinator: Arc<PipelineCoordinator>,
    pub scheduler: Arc<ReleaseScheduler>,
    pub ingestion: Arc<IngestionService>,
}

impl AppState {
    /// Fresh settings snapshot and a store over its directories.
    pub async fn stage_store(&self) -> (PipelineConfig, LocalStageStore) {
        let config = self.coordinator.snapshot().await;
        let store = LocalStageStore::new(config.paths.clone());
        (config, store)
    }
}
