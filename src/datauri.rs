//! Data-URI encoding of uploaded files.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::models::Media;
use crate::upload::UploadedFile;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Encodes `file` as `data:<mime>;base64,<payload>`.
pub fn encode(file: &UploadedFile) -> Media {
    let mime = file
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(FALLBACK_MIME);

    Media::new(format!("data:{};base64,{}", mime, STANDARD.encode(&file.bytes)))
}
