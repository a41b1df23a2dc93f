//! Object storage for uploaded and generated files
//!
//! Two backends sit behind [`BlobStore`]:
//! - S3 (or any S3-compatible endpoint) with presigned download URLs
//! - an in-process map used when no bucket is configured
//!
//! `put` returns a locator: the S3 key, or `memory://{key}` for the
//! in-memory store. Every other operation takes that locator back.

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use backoff::{future::retry, ExponentialBackoff};
use regex_lite::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};
use crate::metrics;

/// Locator prefix used by [`MemoryBlobStore`]
pub const MEMORY_SCHEME: &str = "memory://";

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`, returning the locator
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Fetch the bytes behind a locator
    async fn get(&self, locator: &str) -> Result<Vec<u8>>;

    /// Download URL for a locator, valid for roughly `ttl`
    async fn url(&self, locator: &str, ttl: Duration) -> Result<String>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Top-level key segment, used as the upload metric label
fn category(key: &str) -> &str {
    key.split('/').next().unwrap_or(key)
}

// ============================================================================
// S3
// ============================================================================

pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    retry_budget: Duration,
}

impl S3BlobStore {
    /// Build a client from the default AWS credential chain
    pub async fn new(bucket: String, config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self::with_client(
            S3Client::from_conf(s3_config),
            bucket,
            Duration::from_secs(config.upload_retry_secs),
        )
    }

    /// Create with an existing client
    pub fn with_client(client: S3Client, bucket: String, retry_budget: Duration) -> Self {
        Self { client, bucket, retry_budget }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let size = bytes.len();
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_budget),
            ..ExponentialBackoff::default()
        };

        let client = &self.client;
        let bucket = self.bucket.as_str();
        retry(policy, || {
            let body = ByteStream::from(bytes.clone());
            async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .content_type(content_type)
                    .body(body)
                    .send()
                    .await
                    .map_err(|e| {
                        warn!(key = %key, error = %e, "S3 upload attempt failed");
                        backoff::Error::transient(AppError::Storage {
                            message: format!("Failed to upload {}: {}", key, e),
                        })
                    })
            }
        })
        .await?;

        metrics::record_upload(category(key), size);
        debug!(bucket = %self.bucket, key = %key, size, "Object uploaded");
        Ok(key.to_string())
    }

    async fn get(&self, locator: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(locator)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::FileNotFound { key: locator.to_string() }
                } else {
                    AppError::Storage {
                        message: format!("Failed to download {}: {}", locator, service_error),
                    }
                }
            })?;

        let body = output.body.collect().await.map_err(|e| AppError::Storage {
            message: format!("Failed to read {}: {}", locator, e),
        })?;
        Ok(body.into_bytes().to_vec())
    }

    async fn url(&self, locator: &str, ttl: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| AppError::Configuration {
            message: format!("Invalid presign lifetime: {}", e),
        })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(locator)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::Storage {
                message: format!("Failed to presign {}: {}", locator, e),
            })?;

        Ok(request.uri().to_string())
    }

    fn name(&self) -> &str {
        "s3"
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Object store kept in process memory
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_of(locator: &str) -> &str {
        locator.strip_prefix(MEMORY_SCHEME).unwrap_or(locator)
    }

    /// Content type recorded for a locator
    pub async fn content_type(&self, locator: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(Self::key_of(locator))
            .map(|o| o.content_type.clone())
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let size = bytes.len();
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );

        metrics::record_upload(category(key), size);
        debug!(key = %key, size, "Object stored in memory");
        Ok(format!("{}{}", MEMORY_SCHEME, key))
    }

    async fn get(&self, locator: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(Self::key_of(locator))
            .map(|o| o.bytes.clone())
            .ok_or_else(|| AppError::FileNotFound { key: locator.to_string() })
    }

    async fn url(&self, locator: &str, _ttl: Duration) -> Result<String> {
        let key = Self::key_of(locator);
        if !self.objects.read().await.contains_key(key) {
            return Err(AppError::FileNotFound { key: locator.to_string() });
        }
        Ok(format!("{}{}", MEMORY_SCHEME, key))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Create the blob store for the configured backend
pub async fn create_blob_store(config: &StorageConfig) -> Arc<dyn BlobStore> {
    match config.bucket.as_deref().filter(|b| !b.is_empty()) {
        Some(bucket) => {
            info!(bucket = %bucket, region = %config.region, "Using S3 object storage");
            Arc::new(S3BlobStore::new(bucket.to_string(), config).await)
        }
        None => {
            warn!("No storage bucket configured, keeping files in memory");
            Arc::new(MemoryBlobStore::new())
        }
    }
}

// ============================================================================
// Key layout
// ============================================================================

fn extension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9]{1,10}$").expect("static pattern"))
}

/// Lowercased extension of an uploaded file name, or `bin`
pub fn file_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| extension_pattern().is_match(ext))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

pub mod keys {
    use super::*;

    fn with_extension(prefix: &str, file_name: Option<&str>) -> String {
        format!("{}/{}.{}", prefix, Uuid::new_v4(), file_extension(file_name))
    }

    pub fn pdf() -> String {
        format!("pdfs/{}.pdf", Uuid::new_v4())
    }

    pub fn comment_audio(file_name: Option<&str>) -> String {
        with_extension("audio/comments", file_name)
    }

    pub fn message_audio(file_name: Option<&str>) -> String {
        with_extension("audio/messages", file_name)
    }

    pub fn message_image(file_name: Option<&str>) -> String {
        with_extension("images/messages", file_name)
    }

    pub fn audio(file_name: Option<&str>) -> String {
        with_extension("audio", file_name)
    }

    pub fn image(file_name: Option<&str>) -> String {
        with_extension("images", file_name)
    }

    pub fn export(job_id: Uuid) -> String {
        format!("exports/document_{}.docx", job_id)
    }
}
