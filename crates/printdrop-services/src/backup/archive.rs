use anyhow::{Context, Result};
use printdrop_core::Stage;
use printdrop_storage::StageStore;
use std::io::Write;

use super::listing::list_backup_photos;

/// File name offered to clients downloading the backup archive.
pub const BACKUP_ARCHIVE_NAME: &str = "backup_photos.zip";

/// Create a ZIP archive of every photo in Backup
///
/// Entries are named by identity, which is already a safe flat file name.
pub async fn create_backup_archive(store: &dyn StageStore) -> Result<Vec<u8>> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let photos = list_backup_photos(store)
        .await
        .context("Failed to list backup photos")?;

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for photo in &photos {
            let data = match store.read(Stage::Backup, &photo.identity).await {
                Ok(data) => data,
                Err(e) => {
                    // Removed by hand between listing and reading.
                    tracing::warn!(
                        identity = %photo.identity,
                        error = %e,
                        "Skipping unreadable backup photo"
                    );
                    continue;
                }
            };

            zip.start_file(photo.identity.as_str(), options)
                .with_context(|| format!("Failed to add file to ZIP: {}", photo.identity))?;
            zip.write_all(&data).with_context(|| {
                format!("Failed to write file data to ZIP: {}", photo.identity)
            })?;
        }

        zip.finish().context("Failed to finalize ZIP archive")?;
    }

    tracing::info!(
        photos = photos.len(),
        size_bytes = buffer.len(),
        "Backup archive created"
    );

    Ok(buffer)
}
