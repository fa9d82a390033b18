//! Pipeline coordinator
//!
//! Every Staging to PrintQueue transition runs under one pipeline-wide gate,
//! so "list the oldest N, then move them" is atomic with respect to any other
//! release attempt in the process.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use printdrop_core::{
    ConfigProvider, PipelineConfig, PipelinePhase, ReleaseOutcome, ReleaseReport, Settings, Stage,
};
use printdrop_storage::{LocalStageStore, StageStore, StorageResult};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

pub struct PipelineCoordinator {
    config: Arc<dyn ConfigProvider>,
    data_root: PathBuf,
    gate: Mutex<()>,
    phase: watch::Sender<PipelinePhase>,
    last_staging_count: AtomicUsize,
    total_released: AtomicU64,
}

/// Publishes a phase for the lifetime of a release and falls back to `Idle`
/// when dropped, including on early return.
struct PhaseGuard<'a> {
    phase: &'a watch::Sender<PipelinePhase>,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a watch::Sender<PipelinePhase>, initial: PipelinePhase) -> Self {
        phase.send_replace(initial);
        PhaseGuard { phase }
    }

    fn advance(&self, next: PipelinePhase) {
        self.phase.send_replace(next);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(PipelinePhase::Idle);
    }
}

impl PipelineCoordinator {
    pub fn new(config: Arc<dyn ConfigProvider>, data_root: impl Into<PathBuf>) -> Self {
        let (phase, _) = watch::channel(PipelinePhase::Idle);
        Self {
            config,
            data_root: data_root.into(),
            gate: Mutex::new(()),
            phase,
            last_staging_count: AtomicUsize::new(0),
            total_released: AtomicU64::new(0),
        }
    }

    pub fn config_provider(&self) -> &Arc<dyn ConfigProvider> {
        &self.config
    }

    /// Fresh, validated settings for one operation.
    ///
    /// Settings that cannot be read are logged and replaced by defaults; a bad
    /// settings file never stops the pipeline.
    pub async fn snapshot(&self) -> PipelineConfig {
        let settings = match self.config.load().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        };
        PipelineConfig::resolve(&settings, &self.data_root)
    }

    /// Release up to `batch_size` of the oldest staged photos, using the
    /// directories from the current settings.
    pub async fn attempt_release(&self) -> StorageResult<ReleaseReport> {
        let _gate = self.gate.lock().await;
        let phase = PhaseGuard::enter(&self.phase, PipelinePhase::Evaluating);

        let config = self.snapshot().await;
        self.release_configured(&config, &phase).await
    }

    /// Release on behalf of a scheduler stimulus.
    ///
    /// Returns `None` without evaluating anything when `cancel` fires before
    /// the gate is acquired. Otherwise the batch runs to completion and the
    /// snapshot it used is returned with the result, so the caller can plan its
    /// next wait without loading settings again.
    pub async fn scheduled_release(
        &self,
        cancel: &CancellationToken,
    ) -> Option<(PipelineConfig, StorageResult<ReleaseReport>)> {
        let _gate = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            gate = self.gate.lock() => gate,
        };
        if cancel.is_cancelled() {
            return None;
        }
        let phase = PhaseGuard::enter(&self.phase, PipelinePhase::Evaluating);

        let config = self.snapshot().await;
        let result = self.release_configured(&config, &phase).await;
        Some((config, result))
    }

    /// Same as [`attempt_release`](Self::attempt_release) against an explicit
    /// store and batch size.
    pub async fn release_from(
        &self,
        store: &dyn StageStore,
        batch_size: usize,
    ) -> StorageResult<ReleaseReport> {
        let _gate = self.gate.lock().await;
        let phase = PhaseGuard::enter(&self.phase, PipelinePhase::Evaluating);

        self.release_locked(store, batch_size, &phase).await
    }

    async fn release_configured(
        &self,
        config: &PipelineConfig,
        phase: &PhaseGuard<'_>,
    ) -> StorageResult<ReleaseReport> {
        let store = LocalStageStore::new(config.paths.clone());
        store.ensure_directories().await?;

        self.release_locked(&store, config.batch_size, phase).await
    }

    async fn release_locked(
        &self,
        store: &dyn StageStore,
        batch_size: usize,
        phase: &PhaseGuard<'_>,
    ) -> StorageResult<ReleaseReport> {
        let start = Instant::now();
        let staged = store.list_ordered_by_arrival(Stage::Staging).await?;

        let mut report = ReleaseReport {
            staged: staged.len(),
            batch_size,
            ..ReleaseReport::default()
        };

        if staged.is_empty() {
            self.last_staging_count.store(0, Ordering::Relaxed);
            tracing::debug!("Nothing staged, skipping release");
            return Ok(report);
        }

        phase.advance(PipelinePhase::Releasing);

        for photo in staged.into_iter().take(batch_size) {
            match store
                .move_to(Stage::Staging, Stage::PrintQueue, &photo.identity)
                .await
            {
                Ok(ReleaseOutcome::Moved) => {
                    tracing::debug!(identity = %photo.identity, "Released photo");
                    report.moved.push(photo.identity);
                }
                Ok(ReleaseOutcome::AlreadyReleased) => {
                    tracing::info!(
                        identity = %photo.identity,
                        "Photo already in print queue, skipping"
                    );
                    report.already_released.push(photo.identity);
                }
                Err(e) => {
                    tracing::error!(
                        identity = %photo.identity,
                        error = %e,
                        "Failed to release photo"
                    );
                    report.failed.push((photo.identity, e.to_string()));
                }
            }
        }

        self.last_staging_count.store(report.staged, Ordering::Relaxed);
        self.total_released
            .fetch_add(report.moved.len() as u64, Ordering::Relaxed);

        tracing::info!(
            staged = report.staged,
            batch_size,
            released = report.moved.len(),
            already_released = report.already_released.len(),
            failed = report.failed.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Release completed"
        );

        Ok(report)
    }

    pub fn phase(&self) -> PipelinePhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<PipelinePhase> {
        self.phase.subscribe()
    }

    /// Photos seen in Staging by the most recent release attempt.
    pub fn last_staging_count(&self) -> usize {
        self.last_staging_count.load(Ordering::Relaxed)
    }

    /// Photos moved to PrintQueue since startup.
    pub fn total_released(&self) -> u64 {
        self.total_released.load(Ordering::Relaxed)
    }
}
