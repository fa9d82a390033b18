use printdrop_core::constants::PHOTO_EXTENSIONS;
use printdrop_core::{PhotoFile, Stage};
use printdrop_storage::{StageStore, StorageResult};

/// Photos in Backup, newest first.
///
/// Only `.jpg`, `.jpeg` and `.png` files are listed. Backup is append-only
/// from the pipeline's side, so this read does not take the pipeline gate.
pub async fn list_backup_photos(store: &dyn StageStore) -> StorageResult<Vec<PhotoFile>> {
    let mut photos: Vec<PhotoFile> = store
        .list_ordered_by_arrival(Stage::Backup)
        .await?
        .into_iter()
        .filter(|photo| is_photo(&photo.identity))
        .collect();
    photos.reverse();
    Ok(photos)
}

pub(crate) fn is_photo(identity: &str) -> bool {
    identity
        .rsplit_once('.')
        .map(|(_, ext)| PHOTO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
