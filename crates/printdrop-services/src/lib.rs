//! Printdrop Services Library
//!
//! Business logic on either side of the release pipeline:
//!
//! - `ingest`: validates uploads and commits them into Backup and Staging
//! - `backup`: read-only views of the Backup directory (listing, ZIP export)

pub mod backup;
pub mod ingest;

pub use backup::{create_backup_archive, list_backup_photos, BACKUP_ARCHIVE_NAME};
pub use ingest::{
    IngestError, IngestFailure, IngestReport, IngestionService, UploadValidator, UploadedFile,
    ValidationError,
};
