//! Upload fixtures.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};

const MIB: usize = 1024 * 1024;

/// Bytes with a JPEG start-of-image marker, padded to `size`.
pub fn jpeg_bytes(size: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(size.max(4), 0x42);
    data
}

pub fn jpeg_mib(mib: usize) -> Vec<u8> {
    jpeg_bytes(mib * MIB)
}

pub fn part(name: &str, mime: &str, data: Vec<u8>) -> Part {
    Part::bytes(bytes::Bytes::from(data))
        .file_name(name.to_string())
        .mime_type(mime.to_string())
}

/// Multipart form with one `files` part per entry.
pub fn form(parts: Vec<Part>) -> MultipartForm {
    parts
        .into_iter()
        .fold(MultipartForm::new(), |form, part| form.add_part("files", part))
}
