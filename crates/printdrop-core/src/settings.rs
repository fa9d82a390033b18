//! Pipeline settings
//!
//! `Settings` is the user-editable document kept on disk. It is re-read for
//! every release operation so edits take effect without a restart, and is
//! turned into an immutable [`PipelineConfig`] snapshot by
//! [`PipelineConfig::resolve`], which clamps anything out of range.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::constants::{
    DEFAULT_BACKUP_DIR, DEFAULT_BATCH_SIZE, DEFAULT_PRINT_QUEUE_DIR, DEFAULT_RELEASE_INTERVAL_SECS,
    DEFAULT_STAGING_DIR, DEFAULT_TITLE, MAX_BATCH_SIZE, MAX_RELEASE_INTERVAL_SECS,
    MIN_RELEASE_INTERVAL_SECS,
};
use crate::models::Stage;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Settings as stored on disk.
///
/// Values are kept exactly as the user wrote them; validation happens in
/// [`PipelineConfig::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub release_interval_seconds: i64,
    pub batch_size: i64,
    pub staging_path: String,
    pub print_queue_path: String,
    pub backup_path: String,
    pub title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            release_interval_seconds: DEFAULT_RELEASE_INTERVAL_SECS,
            batch_size: DEFAULT_BATCH_SIZE as i64,
            staging_path: String::new(),
            print_queue_path: String::new(),
            backup_path: String::new(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Absolute directories backing each stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePaths {
    pub staging: PathBuf,
    pub print_queue: PathBuf,
    pub backup: PathBuf,
}

impl StagePaths {
    pub fn dir(&self, stage: Stage) -> &Path {
        match stage {
            Stage::Staging => &self.staging,
            Stage::PrintQueue => &self.print_queue,
            Stage::Backup => &self.backup,
        }
    }

    /// Default layout under a data root.
    pub fn under(root: &Path) -> Self {
        Self {
            staging: root.join(DEFAULT_STAGING_DIR),
            print_queue: root.join(DEFAULT_PRINT_QUEUE_DIR),
            backup: root.join(DEFAULT_BACKUP_DIR),
        }
    }
}

/// Immutable, validated view of the settings for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    #[serde(serialize_with = "serialize_secs")]
    pub release_interval: Duration,
    pub batch_size: usize,
    pub paths: StagePaths,
    pub title: String,
}

fn serialize_secs<S: serde::Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(value.as_secs())
}

impl PipelineConfig {
    /// Validate settings, falling back to safe values for anything invalid.
    ///
    /// - interval `<= 0` uses the default; positive values are clamped to
    ///   `[MIN_RELEASE_INTERVAL_SECS, MAX_RELEASE_INTERVAL_SECS]`
    /// - batch size outside `[1, MAX_BATCH_SIZE]` uses the default
    /// - empty or relative paths use `<data_root>/<default dir>`
    pub fn resolve(settings: &Settings, data_root: &Path) -> Self {
        let interval_secs = if settings.release_interval_seconds <= 0 {
            tracing::debug!(
                configured = settings.release_interval_seconds,
                fallback = DEFAULT_RELEASE_INTERVAL_SECS,
                "Release interval not positive, using default"
            );
            DEFAULT_RELEASE_INTERVAL_SECS
        } else {
            settings
                .release_interval_seconds
                .clamp(MIN_RELEASE_INTERVAL_SECS, MAX_RELEASE_INTERVAL_SECS)
        };

        let batch_size = match usize::try_from(settings.batch_size) {
            Ok(size) if (1..=MAX_BATCH_SIZE).contains(&size) => size,
            _ => {
                tracing::debug!(
                    configured = settings.batch_size,
                    fallback = DEFAULT_BATCH_SIZE,
                    "Batch size out of range, using default"
                );
                DEFAULT_BATCH_SIZE
            }
        };

        let defaults = StagePaths::under(data_root);
        let paths = StagePaths {
            staging: absolute_or(&settings.staging_path, defaults.staging),
            print_queue: absolute_or(&settings.print_queue_path, defaults.print_queue),
            backup: absolute_or(&settings.backup_path, defaults.backup),
        };

        let title = if settings.title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            settings.title.clone()
        };

        Self {
            release_interval: Duration::from_secs(interval_secs as u64),
            batch_size,
            paths,
            title,
        }
    }
}

fn absolute_or(configured: &str, fallback: PathBuf) -> PathBuf {
    let trimmed = configured.trim();
    if !trimmed.is_empty() && Path::new(trimmed).is_absolute() {
        PathBuf::from(trimmed)
    } else {
        fallback
    }
}

/// Source of the current settings.
///
/// Implementations must return the freshest stored values on every call;
/// callers do not cache across operations.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn load(&self) -> Result<Settings, ConfigError>;

    async fn save(&self, settings: &Settings) -> Result<(), ConfigError>;
}

/// Settings stored as a pretty-printed JSON file.
pub struct JsonFileConfigProvider {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileConfigProvider {
    /// Open the settings file, writing defaults if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let provider = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };

        let exists = tokio::fs::try_exists(&provider.path)
            .await
            .map_err(|source| provider.io_error(source))?;
        if !exists {
            tracing::info!(path = %provider.path.display(), "Writing default settings file");
            provider.save(&Settings::default()).await?;
        }

        Ok(provider)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ConfigProvider for JsonFileConfigProvider {
    async fn load(&self) -> Result<Settings, ConfigError> {
        let _guard = self.lock.lock().await;
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(settings)?;
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        // Write next to the target and rename so readers never see half a file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        Ok(())
    }
}
