use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::AppError, images::normalize::UPLOADS_PATH, storage::StorageClient};

pub const ALLOWED_CONTENT_TYPES: [&str; 5] =
    ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

pub struct UploadItem<'a> {
    pub body: Bytes,
    pub content_type: &'a str,
    pub file_name: Option<&'a str>,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Keeps the client's extension when it is a known image extension, else derives one from the type.
fn pick_extension(file_name: Option<&str>, content_type: &str) -> Option<String> {
    let from_name = file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "gif" | "webp"));
    from_name.or_else(|| ext_from_mime(content_type).map(str::to_string))
}

/// Rejects names that could escape the upload namespace.
pub fn check_key(key: &str) -> Result<(), AppError> {
    if key.is_empty() || key.contains(|c: char| c == '/' || c == '\\') || key.contains("..") {
        warn!(key, "rejected upload key");
        return Err(AppError::validation("Invalid file name"));
    }
    Ok(())
}

/// Stores one image and returns the reference to persist (`/uploads/<key>`).
pub async fn store_upload(
    storage: &dyn StorageClient,
    item: UploadItem<'_>,
    max_bytes: usize,
) -> Result<String, AppError> {
    if !ALLOWED_CONTENT_TYPES.contains(&item.content_type) {
        warn!(content_type = item.content_type, "upload rejected: not an image");
        return Err(AppError::validation("Only image uploads are allowed"));
    }
    if item.body.is_empty() {
        return Err(AppError::validation("No image provided"));
    }
    if item.body.len() > max_bytes {
        warn!(bytes = item.body.len(), max_bytes, "upload rejected: too large");
        return Err(AppError::validation(format!(
            "Image exceeds the {max_bytes} byte limit"
        )));
    }

    let ext = pick_extension(item.file_name, item.content_type)
        .ok_or_else(|| AppError::validation("Only image uploads are allowed"))?;
    let key = format!("{}.{}", Uuid::new_v4(), ext);
    let bytes = item.body.len();
    storage
        .put_object(&key, item.body, item.content_type)
        .await?;

    info!(key = %key, bytes, "image uploaded");
    Ok(format!("{}/{}", UPLOADS_PATH, key))
}
