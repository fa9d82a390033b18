#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use printdrop_core::{ConfigError, ConfigProvider, PipelinePhase, Settings, Stage, StagePaths};
use printdrop_storage::{LocalStageStore, StageStore};
use printdrop_worker::PipelineCoordinator;

/// In-memory settings that tests can edit between operations.
#[derive(Default)]
pub struct MemoryConfig {
    settings: Mutex<Settings>,
    fail: Mutex<bool>,
    load_delay: Mutex<Duration>,
}

impl MemoryConfig {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            fail: Mutex::new(false),
            load_delay: Mutex::new(Duration::ZERO),
        }
    }

    pub fn set(&self, settings: Settings) {
        *self.settings.lock().unwrap() = settings;
    }

    /// Make every subsequent load take `delay`, as with a slow disk.
    pub fn slow_loads(&self, delay: Duration) {
        *self.load_delay.lock().unwrap() = delay;
    }

    /// Make every subsequent load fail, as with an unreadable file.
    pub fn fail_loads(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfig {
    async fn load(&self) -> Result<Settings, ConfigError> {
        let delay = *self.load_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        if *self.fail.lock().unwrap() {
            return Err(ConfigError::Io {
                path: "memory".into(),
                source: std::io::Error::other("settings unavailable"),
            });
        }
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        self.set(settings.clone());
        Ok(())
    }
}

pub fn settings(interval: i64, batch: i64) -> Settings {
    Settings {
        release_interval_seconds: interval,
        batch_size: batch,
        ..Settings::default()
    }
}

pub struct Pipeline {
    pub config: Arc<MemoryConfig>,
    pub coordinator: Arc<PipelineCoordinator>,
    pub store: LocalStageStore,
}

/// Coordinator over default stage directories under `root`.
pub fn pipeline(root: &Path, interval: i64, batch: i64) -> Pipeline {
    let config = Arc::new(MemoryConfig::new(settings(interval, batch)));
    let coordinator = Arc::new(PipelineCoordinator::new(config.clone(), root));
    let store = LocalStageStore::new(StagePaths::under(root));
    Pipeline {
        config,
        coordinator,
        store,
    }
}

/// Stage photos one after another so their arrival times are distinct.
pub async fn stage_photos(store: &LocalStageStore, names: &[&str]) {
    for name in names {
        store
            .put(Stage::Backup, name, name.as_bytes())
            .await
            .unwrap();
        store
            .copy_to(Stage::Backup, Stage::Staging, name)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(15)).await;
    }
}

pub async fn names_in(store: &LocalStageStore, stage: Stage) -> Vec<String> {
    store
        .list_ordered_by_arrival(stage)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.identity)
        .collect()
}

/// Poll until `stage` holds `count` files or the timeout passes.
pub async fn wait_for_count(
    store: &LocalStageStore,
    stage: Stage,
    count: usize,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if names_in(store, stage).await.len() == count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

/// Poll until the coordinator reports `phase` or the timeout passes.
pub async fn wait_for_phase(
    coordinator: &PipelineCoordinator,
    phase: PipelinePhase,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if coordinator.phase() == phase {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
