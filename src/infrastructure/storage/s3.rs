use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use bytes::Bytes;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::ObjectStorage;

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    pub bucket: String,
}

impl StorageService {
    pub async fn new(endpoint: &str, bucket: &str, access_key: &str, secret_key: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO
            .build();

        let client = Client::from_conf(config);

        info!("✅ Connected to S3 at {}", endpoint);

        let storage = Self {
            client,
            bucket: bucket.to_string(),
        };

        if let Err(e) = storage.ensure_bucket_exists(bucket).await {
            warn!("Failed to ensure bucket '{}' exists: {}", bucket, e);
        }

        storage
    }

    /// Ensure a bucket exists, creating it if not.
    pub async fn ensure_bucket_exists(&self, bucket_name: &str) -> Result<()> {
        let exists = self.client.head_bucket().bucket(bucket_name).send().await;

        match exists {
            Ok(_) => Ok(()),
            Err(_) => {
                info!("Creating bucket '{}'...", bucket_name);
                self.client
                    .create_bucket()
                    .bucket(bucket_name)
                    .send()
                    .await
                    .map_err(|e| anyhow!("Failed to create bucket '{}': {}", bucket_name, e))?;
                Ok(())
            }
        }
    }

    /// Fetch a whole object into memory. Playlists only; segments are
    /// served through presigned URLs, never through this process.
    pub async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("S3 GetObject error for '{}': {}", key, e))?;

        let data = result
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("S3 stream error for '{}': {}", key, e))?;
        Ok(data.into_bytes().to_vec())
    }

    pub async fn presign_get(&self, key: &str, valid_for: Duration) -> Result<String> {
        let config = PresigningConfig::expires_in(valid_for)
            .map_err(|e| anyhow!("Invalid presign expiry: {}", e))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| anyhow!("Failed to presign GET for '{}': {}", key, e))?;

        Ok(presigned.uri().to_string())
    }

    pub async fn presign_put(&self, key: &str, valid_for: Duration) -> Result<String> {
        let config = PresigningConfig::expires_in(valid_for)
            .map_err(|e| anyhow!("Invalid presign expiry: {}", e))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| anyhow!("Failed to presign PUT for '{}': {}", key, e))?;

        Ok(presigned.uri().to_string())
    }

    pub async fn download_file(&self, key: &str, local_path: &Path) -> Result<()> {
        let mut result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("S3 GetObject error for '{}': {}", key, e))?;

        let mut file = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| anyhow!("Failed to create '{}': {}", local_path.display(), e))?;

        while let Some(chunk) = result
            .body
            .try_next()
            .await
            .map_err(|e| anyhow!("S3 stream error for '{}': {}", key, e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| anyhow!("Write error for '{}': {}", local_path.display(), e))?;
        }

        file.flush().await?;
        Ok(())
    }

    pub async fn upload_file(&self, local_path: &Path, key: &str) -> Result<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| anyhow!("Failed to read '{}': {}", local_path.display(), e))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| anyhow!("S3 PutObject error for '{}': {}", key, e))?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for StorageService {
    async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        self.download_file(key, local_path).await
    }

    async fn upload(&self, local_path: &Path, key: &str) -> Result<()> {
        self.upload_file(local_path, key).await
    }

    async fn put_bytes(&self, key: &str, body: Bytes) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| anyhow!("S3 PutObject error for '{}': {}", key, e))?;

        Ok(())
    }
}
