//! Test helpers: build the full application over a temporary data root.
//!
//! Run from workspace root: `cargo test -p printdrop-api`.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::TestServer;
use printdrop_api::constants;
use printdrop_api::initialize_app;
use printdrop_api::state::AppState;
use printdrop_core::{ServerConfig, Stage, StagePaths};
use printdrop_storage::{LocalStageStore, StageStore};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub shutdown: CancellationToken,
    pub store: LocalStageStore,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn count(&self, stage: Stage) -> usize {
        self.store.list_ordered_by_arrival(stage).await.unwrap().len()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Setup a test app whose timer never fires during a test, so releases
/// happen only when a test asks for them.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let config = ServerConfig::with_data_root(temp_dir.path());
    std::fs::write(
        &config.settings_path,
        r#"{ "release_interval_seconds": 3600, "batch_size": 2, "title": "Test Booth" }"#,
    )
    .unwrap();

    let app = initialize_app(config).await.unwrap();
    let server = TestServer::new(app.router).unwrap();

    TestApp {
        server,
        state: app.state,
        shutdown: app.shutdown,
        store: LocalStageStore::new(StagePaths::under(temp_dir.path())),
        _temp_dir: temp_dir,
    }
}
