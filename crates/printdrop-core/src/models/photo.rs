use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Stage;

/// Descriptor of one photo file as found in a stage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoFile {
    /// Globally unique file name, assigned at ingestion and never changed.
    pub identity: String,
    pub stage: Stage,
    /// Creation time of the file, used for FIFO release ordering.
    pub arrival_time: DateTime<Utc>,
    pub size_bytes: u64,
    pub content_type: String,
}

impl PhotoFile {
    /// Content type implied by an identity's extension.
    pub fn content_type_for(identity: &str) -> &'static str {
        let extension = identity
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            _ => "application/octet-stream",
        }
    }
}
