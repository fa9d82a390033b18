//! Printdrop Storage Library
//!
//! The Stage Store: one directory per pipeline stage (Staging, PrintQueue,
//! Backup), addressed by photo identity.
//!
//! # Identity format
//!
//! `{uuid v7}_{sanitized base name}.{ext}`. The UUID prefix makes identities
//! collision free across concurrent uploads of the same file name and sorts in
//! arrival order. Identities never contain path separators or `..`, and never
//! start with `.`; identity generation and validation live in the `keys`
//! module so every caller agrees on the format.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use keys::{generate_identity, validate_identity};
pub use local::LocalStageStore;
pub use traits::{StageStore, StorageError, StorageResult};
