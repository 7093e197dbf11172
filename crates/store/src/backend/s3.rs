//! S3-compatible datastore: one object per key in a single bucket.

use crate::backend::KvStore;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::instrument;

/// S3-backed key/value store.
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build a client for `bucket`, optionally pinning a region or a custom
    /// endpoint (MinIO and friends).
    pub async fn new(bucket: &str, region: Option<String>, endpoint: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;
        Self {
            client: Client::new(&config),
            bucket: bucket.to_string(),
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(err)) if err.err().is_not_found() => Ok(false),
            Err(e) => Err(StoreError::Backend(format!("head {key}: {e}"))),
        }
    }
}

#[async_trait]
impl KvStore for S3Store {
    #[instrument(skip(self), fields(backend = "s3"))]
    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(SdkError::ServiceError(err)) if err.err().is_no_such_key() => {
                return Err(StoreError::NotFound(key.to_string()));
            }
            Err(e) => return Err(StoreError::Backend(format!("get {key}: {e}"))),
        };
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Backend(format!("read {key}: {e}")))?;
        Ok(data.into_bytes())
    }

    #[instrument(skip(self, value), fields(backend = "s3", size = value.len()))]
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        // Blobs are immutable, so if the object is already there a second
        // upload would only replace identical bytes. Probe the attributes
        // and skip the write instead.
        if self.exists(key).await? {
            tracing::debug!(key, "object already present, skipping upload");
            return Ok(());
        }
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(value))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("put {key}: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn has(&self, key: &str) -> StoreResult<bool> {
        self.exists(key).await
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
