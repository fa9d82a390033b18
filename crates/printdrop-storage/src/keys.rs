//! Identity generation and validation.

use printdrop_core::constants::{ORIGINAL_NAME_MAX_CHARS, PHOTO_EXTENSIONS};
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

const MAX_IDENTITY_LENGTH: usize = 255;

/// Generate a fresh identity for an uploaded file.
///
/// The base name is reduced to `[A-Za-z0-9._-]` and cut to
/// `ORIGINAL_NAME_MAX_CHARS`. The extension is the original one, lowercased,
/// when it is a photo extension; otherwise it is derived from `content_type`.
pub fn generate_identity(original_name: &str, content_type: &str) -> String {
    // Browsers on Windows may send the full client path.
    let file_name = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext.to_ascii_lowercase())),
        _ => (file_name, None),
    };

    let extension = extension
        .filter(|ext| PHOTO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| extension_for(content_type).to_string());

    let base: String = stem
        .chars()
        .take(ORIGINAL_NAME_MAX_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let base = if base.trim_matches('_').is_empty() {
        "photo".to_string()
    } else {
        base
    };

    format!("{}_{}.{}", Uuid::now_v7().simple(), base, extension)
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        _ => "jpg",
    }
}

/// Reject identities that could escape a stage directory or collide with
/// in-progress partial files.
pub fn validate_identity(identity: &str) -> StorageResult<()> {
    if identity.is_empty() || identity.len() > MAX_IDENTITY_LENGTH {
        return Err(StorageError::InvalidIdentity(format!(
            "identity must be 1..={} bytes",
            MAX_IDENTITY_LENGTH
        )));
    }
    if identity.contains(['/', '\\', '\0']) || identity.contains("..") {
        return Err(StorageError::InvalidIdentity(identity.to_string()));
    }
    if identity.starts_with('.') {
        return Err(StorageError::InvalidIdentity(identity.to_string()));
    }
    Ok(())
}
