//! Types used by the ingestion service

use bytes::Bytes;

/// One file as received from the upload transport.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name the client sent; only used to derive the identity.
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Result of a fully accepted upload request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Identities in upload order.
    pub accepted: Vec<String>,
}

impl IngestReport {
    pub fn message(&self) -> String {
        match self.accepted.len() {
            1 => "1 photo uploaded successfully".to_string(),
            n => format!("{} photos uploaded successfully", n),
        }
    }
}
