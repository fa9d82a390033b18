//! Batch release scheduler
//!
//! Two stimuli feed the coordinator: a periodic tick whose interval is re-read
//! from settings every cycle, and one-shot "release after delay" requests made
//! after an upload. Cancellation interrupts waits and keeps new evaluations
//! from starting; a batch that has started moving always finishes.

use std::sync::Arc;
use std::time::Duration;

use printdrop_core::ReleaseReport;
use printdrop_storage::StorageResult;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::coordinator::PipelineCoordinator;

/// Something that can be asked to release staged photos later.
pub trait ReleaseTrigger: Send + Sync {
    /// Schedule a release once `delay` has passed. Returns immediately.
    fn request_release(&self, delay: Duration);
}

pub struct ReleaseScheduler {
    coordinator: Arc<PipelineCoordinator>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl ReleaseScheduler {
    pub fn new(coordinator: Arc<PipelineCoordinator>, cancel: CancellationToken) -> Self {
        Self {
            coordinator,
            cancel,
            tasks: TaskTracker::new(),
        }
    }

    /// Start the periodic release loop in the background.
    ///
    /// The loop waits one interval before each tick and exits when the
    /// cancellation token fires. Each tick loads settings once; its interval
    /// sets the following wait.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(&self);
        self.tasks.spawn(async move {
            tracing::info!("Release scheduler started");

            let mut interval = scheduler.coordinator.snapshot().await.release_interval;
            loop {
                tracing::debug!(interval_secs = interval.as_secs(), "Waiting for next tick");

                tokio::select! {
                    biased;
                    _ = scheduler.cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                match scheduler.coordinator.scheduled_release(&scheduler.cancel).await {
                    Some((config, result)) => {
                        log_release("tick", result);
                        interval = config.release_interval;
                    }
                    None => break,
                }
            }

            tracing::info!("Release scheduler stopped");
        })
    }

    /// One-shot release after `delay`, abandoned if cancelled before it
    /// starts evaluating.
    pub fn release_after(&self, delay: Duration) -> JoinHandle<()> {
        let coordinator = Arc::clone(&self.coordinator);
        let cancel = self.cancel.clone();

        self.tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Delayed release cancelled");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            match coordinator.scheduled_release(&cancel).await {
                Some((_, result)) => log_release("post_upload", result),
                None => tracing::debug!("Delayed release cancelled"),
            }
        })
    }

    /// Cancel pending waits and wait for every started release to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }
}

impl ReleaseTrigger for ReleaseScheduler {
    fn request_release(&self, delay: Duration) {
        tracing::debug!(delay_secs = delay.as_secs(), "Post-upload release requested");
        // Tracked; `shutdown` waits for it.
        drop(self.release_after(delay));
    }
}

fn log_release(trigger: &'static str, result: StorageResult<ReleaseReport>) {
    match result {
        Ok(report) if report.is_noop() => {
            tracing::debug!(trigger, "Release found nothing to do");
        }
        Ok(report) => {
            tracing::debug!(
                trigger,
                released = report.moved.len(),
                failed = report.failed.len(),
                "Release finished"
            );
        }
        // The loop keeps going; the next tick retries.
        Err(e) => {
            tracing::error!(trigger, error = %e, "Release attempt failed");
        }
    }
}
