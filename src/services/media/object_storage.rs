use crate::config::{StorageBackend, StorageConfig};
use crate::errors::ServiceError;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};
use url::Url;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object '{0}' already exists")]
    AlreadyExists(String),
    #[error("storage backend rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage misconfigured: {0}")]
    Config(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::UploadError(err.to_string())
    }
}

/// Write-once blob store returning a publicly readable URL for each object.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Builds the backend selected in configuration.
pub fn storage_from_config(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    match config.backend {
        StorageBackend::Supabase => {
            let url = config
                .supabase_url
                .as_deref()
                .ok_or_else(|| StorageError::Config("supabase_url is not set".into()))?;
            let key = config
                .service_role_key
                .as_deref()
                .ok_or_else(|| StorageError::Config("service_role_key is not set".into()))?;
            Ok(Arc::new(SupabaseStorage::new(url, key, &config.bucket)?))
        }
        StorageBackend::Local => Ok(Arc::new(LocalStorage::new(
            &config.local_dir,
            &config.public_base_url,
        ))),
    }
}

/// Supabase Storage over its REST object API.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: Url,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str, bucket: &str) -> Result<Self, StorageError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StorageError::Config(format!("invalid supabase_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Config(
                "supabase_url must be an absolute http(s) URL".into(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url,
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn object_url(&self, public: bool, key: &str) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::Config("supabase_url cannot be a base".into()))?;
            segments.pop_if_empty().extend(["storage", "v1", "object"]);
            if public {
                segments.push("public");
            }
            segments.push(&self.bucket).push(key);
        }
        Ok(url)
    }

    pub fn public_url(&self, key: &str) -> Result<String, StorageError> {
        Ok(self.object_url(true, key)?.to_string())
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, size = bytes.len()))]
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = self.object_url(false, key)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Supabase answers 400 with a 409 payload for duplicates
            if status == StatusCode::CONFLICT || body.contains("\"409\"") {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }
            error!(status = status.as_u16(), %body, "Supabase upload rejected");
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(key, "Stored object in Supabase");
        self.public_url(key)
    }
}

/// Files under a local directory, served statically under `public_base_url`.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// `public_base_url` with `key` appended as one percent-encoded segment.
    pub fn public_url(&self, key: &str) -> Result<String, StorageError> {
        let mut url = Url::parse(&self.public_base_url)
            .map_err(|e| StorageError::Config(format!("invalid public_base_url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Config("public_base_url cannot be a base".into()))?
            .pop_if_empty()
            .push(key);
        Ok(url.to_string())
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let public_url = self.public_url(key)?;
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(key);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&bytes).await?;
        file.flush().await?;

        debug!(path = %path.display(), "Stored object on local disk");
        Ok(public_url)
    }
}
