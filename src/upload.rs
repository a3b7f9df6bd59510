//! Storage for uploaded proof photos.

use std::path::{Path, PathBuf};

use crate::error::{ApiError, ApiResult};

/// URL prefix uploaded files are served under
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Accepted image types and the extension they are stored with
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// An image file pulled out of a multipart request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    // Ignore parameters such as "; charset=..."
    let mime = content_type.split(';').next().unwrap_or("").trim();
    IMAGE_TYPES
        .iter()
        .find(|(ty, _)| ty.eq_ignore_ascii_case(mime))
        .map(|(_, ext)| *ext)
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Create the upload directory if it is missing
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Reject uploads that are not an accepted image type or are too large
    pub fn validate(&self, image: &ImageUpload) -> ApiResult<&'static str> {
        let ext = image
            .content_type
            .as_deref()
            .and_then(extension_for)
            .ok_or_else(|| {
                ApiError::BadRequest("Only JPEG, PNG, GIF and WebP images are allowed".to_string())
            })?;
        if image.bytes.is_empty() {
            return Err(ApiError::BadRequest("Image upload is required".to_string()));
        }
        if image.bytes.len() > self.max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "Image exceeds the {} byte limit",
                self.max_bytes
            )));
        }
        Ok(ext)
    }

    /// Write a validated image and return the URL it is served at
    pub async fn save(&self, image: &ImageUpload) -> ApiResult<String> {
        let ext = self.validate(image)?;
        let file_name = format!("{}.{}", ulid::Ulid::new().to_string().to_lowercase(), ext);
        let path = self.dir.join(&file_name);

        self.ensure_dir()
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to create upload directory: {}", e)))?;
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to store upload: {}", e)))?;

        tracing::debug!(
            "Stored upload {} ({} bytes)",
            path.display(),
            image.bytes.len()
        );
        Ok(format!("{}/{}", UPLOADS_URL_PREFIX, file_name))
    }
}
