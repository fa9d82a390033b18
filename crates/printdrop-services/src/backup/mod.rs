mod archive;
mod listing;

pub use archive::{create_backup_archive, BACKUP_ARCHIVE_NAME};
pub use listing::list_backup_photos;
