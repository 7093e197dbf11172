//! Write-through read cache in front of an object store.
//!
//! Cache fills run as detached tasks: they never block the foreground
//! response and their errors are swallowed. Presence checks bypass the cache
//! because a cache miss says nothing about absence in the backing store.

use crate::error::StoreResult;
use crate::object::{ObjectRead, ObjectWrite};
use async_trait::async_trait;
use bytes::Bytes;
use cairn_core::{DIGEST_KEY_LEN, Digest};
use dashmap::DashMap;
use std::sync::Arc;

/// Caching wrapper around any [`ObjectWrite`].
#[derive(Clone)]
pub struct CachedStore {
    cache: Arc<DashMap<[u8; DIGEST_KEY_LEN], Bytes>>,
    inner: Arc<dyn ObjectWrite>,
}

impl CachedStore {
    pub fn new(inner: Arc<dyn ObjectWrite>) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            inner,
        }
    }

    /// Number of cached blobs; diagnostics only.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn fill(&self, digest: &Digest, bytes: Bytes) {
        let cache = self.cache.clone();
        let key = digest.to_key();
        let digest = digest.clone();
        tokio::spawn(async move {
            cache.insert(key, bytes);
            tracing::debug!(%digest, "cache filled");
        });
    }
}

#[async_trait]
impl ObjectRead for CachedStore {
    async fn get(&self, digest: &Digest) -> StoreResult<Bytes> {
        if let Some(entry) = self.cache.get(&digest.to_key()) {
            tracing::debug!(%digest, "cache hit");
            return Ok(entry.value().clone());
        }
        let bytes = self.inner.get(digest).await?;
        self.fill(digest, bytes.clone());
        Ok(bytes)
    }

    async fn has(&self, digest: &Digest) -> StoreResult<bool> {
        // Cache presence is not authoritative for absence.
        self.inner.has(digest).await
    }
}

#[async_trait]
impl ObjectWrite for CachedStore {
    async fn put(&self, bytes: Bytes) -> StoreResult<Digest> {
        let digest = self.inner.put(bytes.clone()).await?;
        self.fill(&digest, bytes);
        Ok(digest)
    }
}
