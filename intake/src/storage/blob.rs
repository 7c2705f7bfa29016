//! Object storage for original upload bytes (spec.md §6.3). Wraps S3 so the
//! rest of the crate only sees a small async trait.

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use std::time::Duration;

use crate::config::BlobStoreConfig;
use crate::error::{IntakeError, Result};

#[derive(Debug, Clone)]
pub struct PutResult {
    pub blob_key: String,
    pub blob_version_id: Option<String>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<PutResult>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
    async fn presigned_download_url(&self, key: &str) -> Result<String>;
    async fn delete(&self, key: &str) -> Result<()>;
}

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    presigned_url_ttl: Duration,
}

impl S3BlobStore {
    pub async fn new(config: &BlobStoreConfig) -> Self {
        let region = aws_config::Region::new(config.region.clone());
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        let client = aws_sdk_s3::Client::new(&sdk_config);

        Self {
            client,
            bucket: config.bucket.clone(),
            presigned_url_ttl: Duration::from_secs(config.presigned_url_ttl_secs),
        }
    }

    pub fn document_key(case_id: &str, document_id: &str, filename: &str) -> String {
        format!("cases/{case_id}/documents/{document_id}/{filename}")
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<PutResult> {
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| IntakeError::BlobStore(format!("put_object failed for {key}: {e}")))?;

        Ok(PutResult {
            blob_key: key.to_string(),
            blob_version_id: output.version_id().map(str::to_string),
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| IntakeError::BlobStore(format!("get_object failed for {key}: {e}")))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| IntakeError::BlobStore(format!("reading body failed for {key}: {e}")))?
            .into_bytes();

        Ok(bytes.to_vec())
    }

    async fn presigned_download_url(&self, key: &str) -> Result<String> {
        let presigning_config = PresigningConfig::expires_in(self.presigned_url_ttl)
            .map_err(|e| IntakeError::BlobStore(format!("invalid presign ttl: {e}")))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| IntakeError::BlobStore(format!("presigning failed for {key}: {e}")))?;

        Ok(presigned.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| IntakeError::BlobStore(format!("delete_object failed for {key}: {e}")))?;
        Ok(())
    }
}
