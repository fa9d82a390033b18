mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use printdrop_core::{PhotoFile, PipelinePhase, ReleaseOutcome, Stage};
use printdrop_storage::{LocalStageStore, StageStore, StorageResult};
use printdrop_worker::{ReleaseScheduler, ReleaseTrigger};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use common::{names_in, pipeline, settings, stage_photos, wait_for_count, wait_for_phase};

#[tokio::test]
async fn periodic_tick_releases_staged_photos() {
    let dir = tempdir().unwrap();
    let p = pipeline(dir.path(), 1, 2);
    stage_photos(&p.store, &["t1.jpg", "t2.jpg", "t3.jpg"]).await;

    let cancel = CancellationToken::new();
    let scheduler = Arc::new(ReleaseScheduler::new(p.coordinator.clone(), cancel.clone()));
    let handle = scheduler.start();

    assert!(wait_for_count(&p.store, Stage::PrintQueue, 3, Duration::from_secs(5)).await);
    assert!(names_in(&p.store, Stage::Staging).await.is_empty());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler should stop after cancellation")
        .unwrap();
}

#[tokio::test]
async fn cancellation_interrupts_the_wait() {
    let dir = tempdir().unwrap();
    // A zero interval must not turn into a busy loop either.
    let p = pipeline(dir.path(), 0, 2);
    stage_photos(&p.store, &["w1.jpg"]).await;

    let cancel = CancellationToken::new();
    let scheduler = Arc::new(ReleaseScheduler::new(p.coordinator.clone(), cancel.clone()));
    let handle = scheduler.start();

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("scheduler should stop promptly")
        .unwrap();

    // Default interval is far longer than the test, so nothing was released.
    assert_eq!(names_in(&p.store, Stage::Staging).await, vec!["w1.jpg"]);
    assert_eq!(p.coordinator.total_released(), 0);
}

#[tokio::test]
async fn post_upload_trigger_releases_after_delay() {
    let dir = tempdir().unwrap();
    let p = pipeline(dir.path(), 3600, 2);
    stage_photos(&p.store, &["d1.png", "d2.png", "d3.png"]).await;

    let scheduler = ReleaseScheduler::new(p.coordinator.clone(), CancellationToken::new());
    scheduler
        .release_after(Duration::from_millis(50))
        .await
        .unwrap();

    assert_eq!(
        names_in(&p.store, Stage::PrintQueue).await,
        vec!["d1.png", "d2.png"]
    );
    assert_eq!(names_in(&p.store, Stage::Staging).await, vec!["d3.png"]);
}

#[tokio::test]
async fn trigger_is_fire_and_forget() {
    let dir = tempdir().unwrap();
    let p = pipeline(dir.path(), 3600, 5);
    stage_photos(&p.store, &["q1.jpg", "q2.jpg"]).await;

    let scheduler = ReleaseScheduler::new(p.coordinator.clone(), CancellationToken::new());
    scheduler.request_release(Duration::from_millis(20));

    assert!(wait_for_count(&p.store, Stage::PrintQueue, 2, Duration::from_secs(5)).await);
}

#[tokio::test]
async fn cancelled_trigger_releases_nothing() {
    let dir = tempdir().unwrap();
    let p = pipeline(dir.path(), 3600, 2);
    stage_photos(&p.store, &["c1.jpg"]).await;

    let cancel = CancellationToken::new();
    let scheduler = ReleaseScheduler::new(p.coordinator.clone(), cancel.clone());
    let pending = scheduler.release_after(Duration::from_secs(3600));
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), pending)
        .await
        .expect("delayed release should observe cancellation")
        .unwrap();
    assert_eq!(names_in(&p.store, Stage::Staging).await, vec!["c1.jpg"]);
}

#[tokio::test]
async fn edited_interval_applies_from_the_next_wait() {
    let dir = tempdir().unwrap();
    let p = pipeline(dir.path(), 1, 1);
    stage_photos(&p.store, &["i1.jpg", "i2.jpg", "i3.jpg"]).await;

    let scheduler = Arc::new(ReleaseScheduler::new(
        p.coordinator.clone(),
        CancellationToken::new(),
    ));
    scheduler.clone().start();

    assert!(wait_for_count(&p.store, Stage::PrintQueue, 1, Duration::from_secs(5)).await);
    p.config.set(settings(3600, 1));

    // The wait already under way keeps its old length; its tick picks up the
    // new interval for every wait after it.
    assert!(wait_for_count(&p.store, Stage::PrintQueue, 2, Duration::from_secs(5)).await);
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert_eq!(names_in(&p.store, Stage::PrintQueue).await.len(), 2);
    assert_eq!(names_in(&p.store, Stage::Staging).await, vec!["i3.jpg"]);

    tokio::time::timeout(Duration::from_secs(2), scheduler.shutdown())
        .await
        .unwrap();
}

#[tokio::test]
async fn tick_and_trigger_racing_move_each_photo_once() {
    let dir = tempdir().unwrap();
    let p = pipeline(dir.path(), 1, 2);
    let names = ["x1.jpg", "x2.jpg", "x3.jpg", "x4.jpg", "x5.jpg", "x6.jpg"];
    stage_photos(&p.store, &names).await;

    let scheduler = Arc::new(ReleaseScheduler::new(
        p.coordinator.clone(),
        CancellationToken::new(),
    ));
    scheduler.clone().start();
    scheduler.request_release(Duration::from_secs(1));

    assert!(wait_for_count(&p.store, Stage::PrintQueue, 6, Duration::from_secs(6)).await);
    assert!(names_in(&p.store, Stage::Staging).await.is_empty());
    assert_eq!(p.coordinator.total_released(), 6);

    let mut queued = names_in(&p.store, Stage::PrintQueue).await;
    queued.sort();
    assert_eq!(queued, names);

    tokio::time::timeout(Duration::from_secs(2), scheduler.shutdown())
        .await
        .unwrap();
}

/// Store whose moves take a while, keeping the pipeline gate busy.
struct SlowStore {
    inner: LocalStageStore,
    delay: Duration,
}

#[async_trait]
impl StageStore for SlowStore {
    async fn put(&self, stage: Stage, identity: &str, data: &[u8]) -> StorageResult<()> {
        self.inner.put(stage, identity, data).await
    }

    async fn move_to(
        &self,
        from: Stage,
        to: Stage,
        identity: &str,
    ) -> StorageResult<ReleaseOutcome> {
        tokio::time::sleep(self.delay).await;
        self.inner.move_to(from, to, identity).await
    }

    async fn copy_to(&self, from: Stage, to: Stage, identity: &str) -> StorageResult<()> {
        self.inner.copy_to(from, to, identity).await
    }

    async fn exists(&self, stage: Stage, identity: &str) -> StorageResult<bool> {
        self.inner.exists(stage, identity).await
    }

    async fn read(&self, stage: Stage, identity: &str) -> StorageResult<Vec<u8>> {
        self.inner.read(stage, identity).await
    }

    async fn list_ordered_by_arrival(&self, stage: Stage) -> StorageResult<Vec<PhotoFile>> {
        self.inner.list_ordered_by_arrival(stage).await
    }

    async fn ensure_directories(&self) -> StorageResult<()> {
        self.inner.ensure_directories().await
    }
}

#[tokio::test]
async fn release_queued_behind_the_gate_stops_on_cancel() {
    let dir = tempdir().unwrap();
    let p = pipeline(dir.path(), 3600, 1);
    stage_photos(&p.store, &["g1.jpg", "g2.jpg"]).await;

    let busy = {
        let coordinator = p.coordinator.clone();
        let slow = SlowStore {
            inner: p.store.clone(),
            delay: Duration::from_millis(300),
        };
        tokio::spawn(async move { coordinator.release_from(&slow, 1).await.unwrap() })
    };
    let phase = PipelinePhase::Releasing;
    assert!(wait_for_phase(&p.coordinator, phase, Duration::from_secs(2)).await);

    let cancel = CancellationToken::new();
    let scheduler = ReleaseScheduler::new(p.coordinator.clone(), cancel.clone());
    let queued = scheduler.release_after(Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();

    // The batch holding the gate finishes; the queued release never evaluates.
    let report = busy.await.unwrap();
    assert_eq!(report.moved, vec!["g1.jpg"]);
    tokio::time::timeout(Duration::from_secs(2), queued)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(names_in(&p.store, Stage::Staging).await, vec!["g2.jpg"]);
    assert_eq!(names_in(&p.store, Stage::PrintQueue).await, vec!["g1.jpg"]);
    assert_eq!(p.coordinator.total_released(), 1);
}

#[tokio::test]
async fn shutdown_waits_for_a_release_in_flight() {
    let dir = tempdir().unwrap();
    let p = pipeline(dir.path(), 3600, 2);
    stage_photos(&p.store, &["s1.jpg", "s2.jpg", "s3.jpg"]).await;
    p.config.slow_loads(Duration::from_millis(300));

    let scheduler = ReleaseScheduler::new(p.coordinator.clone(), CancellationToken::new());
    scheduler.request_release(Duration::ZERO);
    let phase = PipelinePhase::Evaluating;
    assert!(wait_for_phase(&p.coordinator, phase, Duration::from_secs(2)).await);

    tokio::time::timeout(Duration::from_secs(5), scheduler.shutdown())
        .await
        .expect("shutdown should wait for the batch, then return");

    // The whole batch landed before shutdown returned.
    assert_eq!(
        names_in(&p.store, Stage::PrintQueue).await,
        vec!["s1.jpg", "s2.jpg"]
    );
    assert_eq!(names_in(&p.store, Stage::Staging).await, vec!["s3.jpg"]);
    assert_eq!(p.coordinator.phase(), PipelinePhase::Idle);
}
