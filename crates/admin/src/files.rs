//! Reading local files for uploads and entry photos.

use std::path::Path;

use anyhow::Context;
use cakung_client::transport::FilePart;
use cakung_core::photo::normalize_photo;

/// Multipart field name the asset endpoint expects.
const UPLOAD_FIELD: &str = "file";

/// MIME type from the file extension. Unknown extensions are sent as
/// generic binary.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Read `path` into an upload part.
pub fn read_file_part(path: &Path) -> anyhow::Result<FilePart> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(FilePart::new(UPLOAD_FIELD, file_name, guess_mime(path), bytes))
}

/// Read an image and return it resized and encoded as a data URL.
pub fn load_photo(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let photo = normalize_photo(&bytes).with_context(|| format!("processing {}", path.display()))?;
    tracing::debug!(path = %path.display(), encoded_len = photo.len(), "Photo normalized");
    Ok(photo)
}
