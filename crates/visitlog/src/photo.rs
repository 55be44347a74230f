//! Photo attachment.
//!
//! Entries embed their photo as a `data:` URI so the collection stays a
//! single self-contained document.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::error::{Error, Result};

/// Mime type guessed from a file extension.
#[must_use]
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Build a data URI from raw bytes.
#[must_use]
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", B64.encode(bytes))
}

/// Read an image file and encode it as a data URI.
///
/// # Errors
///
/// Returns [`Error::ImportFailure`] if the file cannot be read or is empty.
pub async fn encode_photo(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::import_failure(path, e.to_string()))?;
    if bytes.is_empty() {
        return Err(Error::import_failure(path, "photo file is empty"));
    }
    Ok(to_data_uri(mime_for(path), &bytes))
}
