//! Data-URL thumbnails for image files.

use base64::{Engine, engine::general_purpose::STANDARD};
use chunkup_transfer::UploadFile;
use tracing::debug;

/// Returns `true` if a preview should be built for `file`.
pub fn wants_preview(file: &UploadFile, max_bytes: u64) -> bool {
    file.is_image() && file.size > 0 && file.size <= max_bytes
}

/// Encodes `data` as a `data:` URL.
pub fn data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(data))
}

/// Reads `file` and returns its data URL, or `None` if it is not eligible
/// or cannot be read. Never affects the upload itself.
pub async fn build_preview(file: &UploadFile, max_bytes: u64) -> Option<String> {
    if !wants_preview(file, max_bytes) {
        return None;
    }
    match file.read_range_async(0, file.size).await {
        Ok(data) => Some(data_url(&file.mime_type, &data)),
        Err(e) => {
            debug!(file = %file.name, error = %e, "preview unavailable");
            None
        }
    }
}
