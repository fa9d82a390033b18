//! Service initialization

use crate::state::AppState;
use anyhow::{Context, Result};
use printdrop_core::{ConfigProvider, JsonFileConfigProvider, ServerConfig};
use printdrop_services::IngestionService;
use printdrop_storage::{LocalStageStore, StageStore};
use printdrop_worker::{PipelineCoordinator, ReleaseScheduler};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Open settings, create stage directories and build the pipeline services.
pub async fn initialize_services(
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> Result<Arc<AppState>> {
    let provider = JsonFileConfigProvider::open(&config.settings_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open settings file {}",
                config.settings_path.display()
            )
        })?;
    tracing::info!(path = %provider.path().display(), "Settings file opened");
    let provider: Arc<dyn ConfigProvider> = Arc::new(provider);

    let coordinator = Arc::new(PipelineCoordinator::new(provider, &config.data_root));

    let snapshot = coordinator.snapshot().await;
    LocalStageStore::new(snapshot.paths.clone())
        .ensure_directories()
        .await
        .context("Failed to create stage directories")?;

    tracing::info!(
        staging = %snapshot.paths.staging.display(),
        print_queue = %snapshot.paths.print_queue.display(),
        backup = %snapshot.paths.backup.display(),
        "Stage directories ready"
    );
    tracing::info!(
        title = %snapshot.title,
        release_interval_secs = snapshot.release_interval.as_secs(),
        batch_size = snapshot.batch_size,
        "Pipeline settings loaded"
    );

    let scheduler = Arc::new(ReleaseScheduler::new(coordinator.clone(), shutdown));
    let ingestion = Arc::new(IngestionService::new(
        coordinator.clone(),
        scheduler.clone(),
    ));

    Ok(Arc::new(AppState {
        config: config.clone(),
        coordinator,
        scheduler,
        ingestion,
    }))
}
