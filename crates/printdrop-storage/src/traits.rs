//! Stage Store abstraction
//!
//! This module defines the `StageStore` trait the pipeline is written against.

use std::path::PathBuf;

use async_trait::async_trait;
use printdrop_core::{PhotoFile, ReleaseOutcome, Stage};
use thiserror::Error;

/// Stage Store operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File already exists in {stage}: {identity}")]
    AlreadyExists { stage: Stage, identity: String },

    #[error("File not found in {stage}: {identity}")]
    NotFound { stage: Stage, identity: String },

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Directory-backed store keyed by photo identity.
///
/// A file is only ever visible in a stage once it is complete: writes land in
/// a hidden partial file first and are linked into place.
#[async_trait]
pub trait StageStore: Send + Sync {
    /// Write a new file. Fails with `AlreadyExists` instead of overwriting.
    async fn put(&self, stage: Stage, identity: &str, data: &[u8]) -> StorageResult<()>;

    /// Move a file between stages by rename.
    ///
    /// If the destination already holds `identity` the move is treated as done
    /// by an earlier attempt: any leftover source is removed and
    /// `AlreadyReleased` is returned. The destination is never overwritten.
    async fn move_to(&self, from: Stage, to: Stage, identity: &str)
        -> StorageResult<ReleaseOutcome>;

    /// Duplicate a file into another stage, leaving the source in place.
    async fn copy_to(&self, from: Stage, to: Stage, identity: &str) -> StorageResult<()>;

    async fn exists(&self, stage: Stage, identity: &str) -> StorageResult<bool>;

    async fn read(&self, stage: Stage, identity: &str) -> StorageResult<Vec<u8>>;

    /// Snapshot of the complete files in a stage, oldest arrival first.
    ///
    /// The returned list is finite and can be iterated any number of times;
    /// call again for a fresh view.
    async fn list_ordered_by_arrival(&self, stage: Stage) -> StorageResult<Vec<PhotoFile>>;

    /// Create every stage directory that does not exist yet.
    async fn ensure_directories(&self) -> StorageResult<()>;
}
