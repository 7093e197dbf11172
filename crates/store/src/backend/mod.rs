//! Raw key/value datastore backends.
//!
//! At this level there is no notion of digests or blob structure, only named
//! byte values. Content addressing is layered on top by
//! [`BlobStore`](crate::object::BlobStore).

pub mod filesystem;
pub mod memory;
pub mod s3;

use crate::error::StoreResult;
use async_trait::async_trait;
use bytes::Bytes;
use cairn_core::config::StorageConfig;
use std::sync::Arc;

pub use filesystem::FsStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

/// Low-level keyed byte storage.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// Write `value` under `key`. Writing an existing key is permitted and
    /// may be a no-op for backends where replacement is expensive.
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()>;

    /// Presence check without reading the value.
    async fn has(&self, key: &str) -> StoreResult<bool>;

    /// Static backend identifier, used in logs.
    fn backend_name(&self) -> &'static str;
}

/// Create a datastore backend from configuration.
pub async fn from_config(config: &StorageConfig) -> StoreResult<Arc<dyn KvStore>> {
    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FsStore::new(path).await?;
            Ok(Arc::new(backend))
        }
        StorageConfig::S3 {
            bucket,
            region,
            endpoint,
        } => {
            let backend = S3Store::new(bucket, region.clone(), endpoint.clone()).await;
            Ok(Arc::new(backend))
        }
        StorageConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
