//! Multipart extraction for photo uploads

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use printdrop_core::AppError;
use printdrop_services::UploadedFile;

/// Collect every file part of a multipart form, in order.
///
/// Any field that carries a non-empty file name is an upload, whatever its
/// field name. Plain form fields and empty file inputs are ignored.
pub async fn extract_multipart_files(
    mut multipart: Multipart,
) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(filename) = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
        else {
            continue;
        };

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field.bytes().await.map_err(multipart_error)?;

        files.push(UploadedFile::new(filename, content_type, data));
    }

    Ok(files)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Request body too large: {}", err.body_text()))
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}
