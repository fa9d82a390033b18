use crate::keys::validate_identity;
use crate::traits::{StageStore, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use printdrop_core::constants::PARTIAL_FILE_PREFIX;
use printdrop_core::{PhotoFile, ReleaseOutcome, Stage, StagePaths};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem Stage Store, one directory per stage
#[derive(Debug, Clone)]
pub struct LocalStageStore {
    paths: StagePaths,
}

impl LocalStageStore {
    /// Create a store over the given stage directories.
    ///
    /// Directories are not touched until [`StageStore::ensure_directories`] or
    /// the first write.
    pub fn new(paths: StagePaths) -> Self {
        LocalStageStore { paths }
    }

    pub fn paths(&self) -> &StagePaths {
        &self.paths
    }

    fn file_path(&self, stage: Stage, identity: &str) -> StorageResult<PathBuf> {
        validate_identity(identity)?;
        Ok(self.paths.dir(stage).join(identity))
    }

    fn partial_path(&self, stage: Stage) -> PathBuf {
        self.paths.dir(stage).join(format!(
            "{}{}",
            PARTIAL_FILE_PREFIX,
            Uuid::new_v4().simple()
        ))
    }

    async fn ensure_dir(&self, stage: Stage) -> StorageResult<()> {
        let dir = self.paths.dir(stage);
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StorageError::io(dir, e))
    }

    /// Write `data` to a fresh partial file in `stage` and flush it to disk.
    async fn write_partial(&self, stage: Stage, data: &[u8]) -> StorageResult<PathBuf> {
        let partial = self.partial_path(stage);

        let written = async {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&partial)
                .await?;
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        match written {
            Ok(()) => Ok(partial),
            Err(e) => {
                discard_partial(&partial).await;
                Err(StorageError::io(&partial, e))
            }
        }
    }

    /// Copy an existing file into a fresh partial file in `stage` and flush it.
    async fn copy_partial(
        &self,
        source: &Path,
        from: Stage,
        to: Stage,
        identity: &str,
    ) -> StorageResult<PathBuf> {
        let partial = self.partial_path(to);

        let copied = async {
            fs::copy(source, &partial).await?;
            fs::File::open(&partial).await?.sync_all().await
        }
        .await;

        match copied {
            Ok(()) => Ok(partial),
            Err(e) => {
                discard_partial(&partial).await;
                if e.kind() == ErrorKind::NotFound && !source_exists(source).await {
                    Err(StorageError::NotFound {
                        stage: from,
                        identity: identity.to_string(),
                    })
                } else {
                    Err(StorageError::io(source, e))
                }
            }
        }
    }

    /// Give a completed partial file its final name, never replacing an
    /// existing file. The partial file is gone afterwards in every case.
    async fn publish(
        &self,
        partial: &Path,
        target: &Path,
        stage: Stage,
        identity: &str,
    ) -> StorageResult<()> {
        let published = match fs::hard_link(partial, target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StorageError::AlreadyExists {
                stage,
                identity: identity.to_string(),
            }),
            Err(e) => {
                // Some filesystems (FAT, certain network mounts) have no hard links.
                tracing::debug!(
                    error = %e,
                    path = %target.display(),
                    "Hard link unavailable, falling back to rename"
                );
                match fs::try_exists(target).await {
                    Ok(true) => Err(StorageError::AlreadyExists {
                        stage,
                        identity: identity.to_string(),
                    }),
                    Ok(false) => match fs::rename(partial, target).await {
                        Ok(()) => return Ok(()),
                        Err(e) => Err(StorageError::io(target, e)),
                    },
                    Err(e) => Err(StorageError::io(target, e)),
                }
            }
        };

        discard_partial(partial).await;
        published
    }

    /// Rename failed with EXDEV: copy into the destination, then drop the source.
    async fn move_across_devices(
        &self,
        source: &Path,
        target: &Path,
        from: Stage,
        to: Stage,
        identity: &str,
    ) -> StorageResult<ReleaseOutcome> {
        let partial = self.copy_partial(source, from, to, identity).await?;
        let outcome = match self.publish(&partial, target, to, identity).await {
            Ok(()) => ReleaseOutcome::Moved,
            Err(StorageError::AlreadyExists { .. }) => ReleaseOutcome::AlreadyReleased,
            Err(e) => return Err(e),
        };

        remove_if_present(source).await?;
        Ok(outcome)
    }
}

async fn discard_partial(partial: &Path) {
    if let Err(e) = fs::remove_file(partial).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!(
                error = %e,
                path = %partial.display(),
                "Failed to remove partial file"
            );
        }
    }
}

async fn source_exists(source: &Path) -> bool {
    fs::try_exists(source).await.unwrap_or(false)
}

/// Returns whether a file was removed.
async fn remove_if_present(path: &Path) -> StorageResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

fn not_found(stage: Stage, identity: &str) -> StorageError {
    StorageError::NotFound {
        stage,
        identity: identity.to_string(),
    }
}

#[async_trait]
impl StageStore for LocalStageStore {
    async fn put(&self, stage: Stage, identity: &str, data: &[u8]) -> StorageResult<()> {
        let target = self.file_path(stage, identity)?;
        self.ensure_dir(stage).await?;

        let start = Instant::now();
        let partial = self.write_partial(stage, data).await?;
        self.publish(&partial, &target, stage, identity).await?;

        tracing::debug!(
            stage = %stage,
            identity = %identity,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored file"
        );

        Ok(())
    }

    async fn move_to(
        &self,
        from: Stage,
        to: Stage,
        identity: &str,
    ) -> StorageResult<ReleaseOutcome> {
        let source = self.file_path(from, identity)?;
        let target = self.file_path(to, identity)?;
        self.ensure_dir(to).await?;

        if fs::try_exists(&target)
            .await
            .map_err(|e| StorageError::io(&target, e))?
        {
            if remove_if_present(&source).await? {
                tracing::warn!(
                    identity = %identity,
                    from = %from,
                    to = %to,
                    "Destination already present, removed leftover source"
                );
            }
            return Ok(ReleaseOutcome::AlreadyReleased);
        }

        match fs::rename(&source, &target).await {
            Ok(()) => Ok(ReleaseOutcome::Moved),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(from, identity)),
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                self.move_across_devices(&source, &target, from, to, identity)
                    .await
            }
            Err(e) => Err(StorageError::io(&source, e)),
        }
    }

    async fn copy_to(&self, from: Stage, to: Stage, identity: &str) -> StorageResult<()> {
        let source = self.file_path(from, identity)?;
        let target = self.file_path(to, identity)?;
        self.ensure_dir(to).await?;

        let partial = self.copy_partial(&source, from, to, identity).await?;
        self.publish(&partial, &target, to, identity).await
    }

    async fn exists(&self, stage: Stage, identity: &str) -> StorageResult<bool> {
        let path = self.file_path(stage, identity)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::io(&path, e))
    }

    async fn read(&self, stage: Stage, identity: &str) -> StorageResult<Vec<u8>> {
        let path = self.file_path(stage, identity)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(stage, identity)),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    async fn list_ordered_by_arrival(&self, stage: Stage) -> StorageResult<Vec<PhotoFile>> {
        let dir = self.paths.dir(stage);
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(dir, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(dir, e))?
        {
            let Some(identity) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            // Partial writes and other hidden files are never part of a stage.
            if identity.starts_with('.') {
                continue;
            }
            // Dropped in by hand under a name no stage operation accepts.
            if let Err(e) = validate_identity(&identity) {
                tracing::warn!(
                    stage = %stage,
                    error = %e,
                    "Skipping file with an unusable name"
                );
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                // Moved away between read_dir and stat.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::io(entry.path(), e)),
            };
            if !metadata.is_file() {
                continue;
            }

            let arrival = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            files.push(PhotoFile {
                content_type: PhotoFile::content_type_for(&identity).to_string(),
                identity,
                stage,
                arrival_time: DateTime::<Utc>::from(arrival),
                size_bytes: metadata.len(),
            });
        }

        // Identities start with a time-ordered UUID, so they break timestamp ties.
        files.sort_by(|a, b| {
            a.arrival_time
                .cmp(&b.arrival_time)
                .then_with(|| a.identity.cmp(&b.identity))
        });

        Ok(files)
    }

    async fn ensure_directories(&self) -> StorageResult<()> {
        for stage in Stage::ALL {
            self.ensure_dir(stage).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn store_in(root: &Path) -> LocalStageStore {
        LocalStageStore::new(StagePaths::under(root))
    }

    fn names(files: &[PhotoFile]) -> Vec<&str> {
        files.iter().map(|f| f.identity.as_str()).collect()
    }

    #[tokio::test]
    async fn test_put_and_read() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store
            .put(Stage::Backup, "a_beach.jpg", b"jpeg bytes")
            .await
            .unwrap();

        assert!(store.exists(Stage::Backup, "a_beach.jpg").await.unwrap());
        assert_eq!(
            store.read(Stage::Backup, "a_beach.jpg").await.unwrap(),
            b"jpeg bytes"
        );
    }

    #[tokio::test]
    async fn test_put_never_overwrites() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store.put(Stage::Staging, "a.jpg", b"first").await.unwrap();
        let result = store.put(Stage::Staging, "a.jpg", b"second").await;

        assert!(matches!(result, Err(StorageError::AlreadyExists { .. })));
        assert_eq!(store.read(Stage::Staging, "a.jpg").await.unwrap(), b"first");

        // No partial file is left behind by the failed write.
        let leftovers: Vec<_> = std::fs::read_dir(&store.paths().staging)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("a.jpg")]);
    }

    #[tokio::test]
    async fn test_move_is_exclusive_and_idempotent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.put(Stage::Staging, "a.jpg", b"photo").await.unwrap();

        let first = store
            .move_to(Stage::Staging, Stage::PrintQueue, "a.jpg")
            .await
            .unwrap();
        assert_eq!(first, ReleaseOutcome::Moved);
        assert!(!store.exists(Stage::Staging, "a.jpg").await.unwrap());
        assert!(store.exists(Stage::PrintQueue, "a.jpg").await.unwrap());

        let second = store
            .move_to(Stage::Staging, Stage::PrintQueue, "a.jpg")
            .await
            .unwrap();
        assert_eq!(second, ReleaseOutcome::AlreadyReleased);
        assert_eq!(
            store.read(Stage::PrintQueue, "a.jpg").await.unwrap(),
            b"photo"
        );
    }

    #[tokio::test]
    async fn test_move_onto_existing_destination_keeps_it_and_drops_source() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.put(Stage::PrintQueue, "a.jpg", b"released").await.unwrap();
        store.put(Stage::Staging, "a.jpg", b"leftover").await.unwrap();

        let outcome = store
            .move_to(Stage::Staging, Stage::PrintQueue, "a.jpg")
            .await
            .unwrap();

        assert_eq!(outcome, ReleaseOutcome::AlreadyReleased);
        assert!(!store.exists(Stage::Staging, "a.jpg").await.unwrap());
        assert_eq!(
            store.read(Stage::PrintQueue, "a.jpg").await.unwrap(),
            b"released"
        );
    }

    #[tokio::test]
    async fn test_move_missing_source_is_not_found() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_directories().await.unwrap();

        let result = store
            .move_to(Stage::Staging, Stage::PrintQueue, "ghost.jpg")
            .await;

        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_copy_keeps_source() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.put(Stage::Backup, "a.png", b"png").await.unwrap();

        store
            .copy_to(Stage::Backup, Stage::Staging, "a.png")
            .await
            .unwrap();

        assert_eq!(store.read(Stage::Backup, "a.png").await.unwrap(), b"png");
        assert_eq!(store.read(Stage::Staging, "a.png").await.unwrap(), b"png");

        let again = store.copy_to(Stage::Backup, Stage::Staging, "a.png").await;
        assert!(matches!(again, Err(StorageError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_not_found() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_directories().await.unwrap();

        let result = store.copy_to(Stage::Backup, Stage::Staging, "ghost.png").await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_orders_by_arrival_and_skips_partials() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        for name in ["c.jpg", "a.jpg", "b.png"] {
            store.put(Stage::Staging, name, name.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let staging = &store.paths().staging;
        std::fs::write(staging.join(".partial-inflight"), b"half").unwrap();
        std::fs::create_dir(staging.join("nested")).unwrap();

        let files = store.list_ordered_by_arrival(Stage::Staging).await.unwrap();

        assert_eq!(names(&files), vec!["c.jpg", "a.jpg", "b.png"]);
        assert_eq!(files[2].content_type, "image/png");
        assert_eq!(files[0].size_bytes, 5);
        assert!(files.iter().all(|f| f.stage == Stage::Staging));

        // The snapshot is restartable.
        assert_eq!(names(&files), names(&files.clone()));
    }

    #[tokio::test]
    async fn test_list_skips_names_that_cannot_be_addressed() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_directories().await.unwrap();

        // Copied into the directory by hand, ahead of every valid photo.
        let staging = &store.paths().staging;
        std::fs::write(staging.join("guest..photo.jpg"), b"manual").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.put(Stage::Staging, "ok.jpg", b"ok").await.unwrap();

        let files = store.list_ordered_by_arrival(Stage::Staging).await.unwrap();
        assert_eq!(names(&files), vec!["ok.jpg"]);

        // Every listed name can be moved.
        for file in &files {
            let outcome = store
                .move_to(Stage::Staging, Stage::PrintQueue, &file.identity)
                .await
                .unwrap();
            assert_eq!(outcome, ReleaseOutcome::Moved);
        }
        assert!(staging.join("guest..photo.jpg").exists());
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir.path().join("not-created"));

        let files = store.list_ordered_by_arrival(Stage::PrintQueue).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_directories_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store.ensure_directories().await.unwrap();
        store.ensure_directories().await.unwrap();

        for stage in Stage::ALL {
            assert!(store.paths().dir(stage).is_dir());
        }
    }

    #[tokio::test]
    async fn test_invalid_identity_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let result = store.put(Stage::Staging, "../escape.jpg", b"x").await;
        assert!(matches!(result, Err(StorageError::InvalidIdentity(_))));

        let result = store.read(Stage::Backup, "/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidIdentity(_))));
    }
}
