//! Fixed limits of the photo pipeline.

/// Largest accepted upload, per file.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Content types the ingestion unit accepts.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Extensions recognised as photos when reading a stage directory.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Characters of the original base name kept in a generated identity.
pub const ORIGINAL_NAME_MAX_CHARS: usize = 40;

/// Release interval used when the configured value is zero or negative.
pub const DEFAULT_RELEASE_INTERVAL_SECS: i64 = 30;
pub const MIN_RELEASE_INTERVAL_SECS: i64 = 1;
pub const MAX_RELEASE_INTERVAL_SECS: i64 = 86_400;

/// Batch size used when the configured value is out of range.
pub const DEFAULT_BATCH_SIZE: usize = 2;
pub const MAX_BATCH_SIZE: usize = 100;

/// Directory names used under the data root when a path is not configured.
pub const DEFAULT_STAGING_DIR: &str = "staging";
pub const DEFAULT_PRINT_QUEUE_DIR: &str = "print-queue";
pub const DEFAULT_BACKUP_DIR: &str = "backup";

pub const DEFAULT_TITLE: &str = "Printdrop";

/// Prefix for in-progress writes inside a stage directory. Listings skip these.
pub const PARTIAL_FILE_PREFIX: &str = ".partial-";
