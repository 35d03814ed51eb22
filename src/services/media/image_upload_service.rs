use super::object_storage::ObjectStorage;
use crate::errors::ServiceError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use tracing::{info, instrument};

/// A client-side file, base64 encoded
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub file_base64: String,
    pub content_type: String,
}

#[derive(Clone)]
pub struct ImageUploadService {
    storage: Arc<dyn ObjectStorage>,
    max_bytes: usize,
}

impl ImageUploadService {
    pub fn new(storage: Arc<dyn ObjectStorage>, max_bytes: usize) -> Self {
        Self { storage, max_bytes }
    }

    /// Stores the image under `{unix millis}-{file name}` and returns its public URL.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, content_type = %upload.content_type))]
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<String, ServiceError> {
        let name = base_name(&upload.file_name)
            .ok_or_else(|| ServiceError::ValidationError("fileName must not be empty".into()))?;

        let content_type = upload.content_type.trim();
        if !content_type.starts_with("image/") {
            return Err(ServiceError::ValidationError(format!(
                "contentType must be an image type, got '{}'",
                content_type
            )));
        }

        let bytes = decode_payload(&upload.file_base64)?;
        if bytes.is_empty() {
            return Err(ServiceError::ValidationError("fileBase64 is empty".into()));
        }
        if bytes.len() > self.max_bytes {
            return Err(ServiceError::ValidationError(format!(
                "image is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }

        let key = format!("{}-{}", Utc::now().timestamp_millis(), name);
        let size = bytes.len();
        let url = self.storage.put_object(&key, bytes, content_type).await?;

        counter!("storefront.images.uploaded", 1);
        info!(key = %key, size, "Uploaded product image");
        Ok(url)
    }
}

/// Last path component, so client paths never become storage prefixes.
fn base_name(file_name: &str) -> Option<&str> {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

/// Accepts raw base64 or a `data:<type>;base64,` URL.
fn decode_payload(payload: &str) -> Result<Vec<u8>, ServiceError> {
    let trimmed = payload.trim();
    let data = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| {
                ServiceError::ValidationError("data URL must be base64 encoded".into())
            })?,
        None => trimmed,
    };
    STANDARD
        .decode(data)
        .map_err(|e| ServiceError::ValidationError(format!("fileBase64 is not valid base64: {}", e)))
}
