//! Content-addressed object store.
//!
//! [`BlobStore`] layers digest computation and verification over any
//! [`KvStore`]; the capability traits [`ObjectRead`] and [`ObjectWrite`] are
//! what the rest of the system programs against, so caches, layered readers
//! and remote clients compose by wrapping values.

use crate::backend::KvStore;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use cairn_core::Digest;
use std::sync::Arc;

/// Read-side capability: fetch and presence-check blobs by digest.
#[async_trait]
pub trait ObjectRead: Send + Sync + 'static {
    /// Read the blob stored under `digest`. Implementations verify content
    /// against the digest before returning it.
    async fn get(&self, digest: &Digest) -> StoreResult<Bytes>;

    /// Presence check without reading the blob.
    async fn has(&self, digest: &Digest) -> StoreResult<bool>;
}

/// Write-side capability on top of [`ObjectRead`].
#[async_trait]
pub trait ObjectWrite: ObjectRead {
    /// Store `bytes` under its computed digest and return it. Idempotent.
    async fn put(&self, bytes: Bytes) -> StoreResult<Digest>;
}

/// Content-addressed store over a raw datastore. Keys are the digest human
/// form, which is also the on-disk / in-bucket naming scheme.
#[derive(Clone)]
pub struct BlobStore {
    inner: Arc<dyn KvStore>,
}

impl BlobStore {
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        Self { inner }
    }

    /// Store `bytes`, failing with `DigestMismatch` if the computed digest
    /// differs from `expected`. The blob is persisted under its actual
    /// digest either way.
    pub async fn put_verified(&self, bytes: Bytes, expected: &Digest) -> StoreResult<Digest> {
        let actual = self.put(bytes).await?;
        if &actual != expected {
            return Err(StoreError::DigestMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(actual)
    }
}

#[async_trait]
impl ObjectRead for BlobStore {
    async fn get(&self, digest: &Digest) -> StoreResult<Bytes> {
        let bytes = self.inner.get(&digest.to_human()).await?;
        let actual = Digest::compute_with(digest.codec(), &bytes);
        if &actual != digest {
            return Err(StoreError::DigestMismatch {
                expected: digest.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(bytes)
    }

    async fn has(&self, digest: &Digest) -> StoreResult<bool> {
        self.inner.has(&digest.to_human()).await
    }
}

#[async_trait]
impl ObjectWrite for BlobStore {
    async fn put(&self, bytes: Bytes) -> StoreResult<Digest> {
        let digest = Digest::compute(&bytes);
        let key = digest.to_human();
        if !self.inner.has(&key).await? {
            self.inner.put(&key, bytes).await?;
        }
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;

    fn store() -> (Arc<MemoryStore>, BlobStore) {
        let kv = Arc::new(MemoryStore::new());
        (kv.clone(), BlobStore::new(kv))
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (_, blobs) = store();
        let digest = blobs.put(Bytes::from_static(b"hello world")).await.unwrap();
        assert_eq!(
            digest.to_human(),
            "sha2-256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert!(blobs.has(&digest).await.unwrap());
        assert_eq!(
            blobs.get(&digest).await.unwrap(),
            Bytes::from_static(b"hello world")
        );
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let (kv, blobs) = store();
        let first = blobs.put(Bytes::from_static(b"same")).await.unwrap();
        let second = blobs.put(Bytes::from_static(b"same")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(kv.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_, blobs) = store();
        let digest = Digest::compute(b"never stored");
        assert!(!blobs.has(&digest).await.unwrap());
        assert!(matches!(
            blobs.get(&digest).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupted_blob_is_withheld() {
        let (kv, blobs) = store();
        let digest = blobs.put(Bytes::from_static(b"original")).await.unwrap();
        // Corrupt the backing value directly.
        kv.put(&digest.to_human(), Bytes::from_static(b"tampered"))
            .await
            .unwrap();
        match blobs.get(&digest).await {
            Err(StoreError::DigestMismatch { expected, .. }) => {
                assert_eq!(expected, digest.to_string());
            }
            other => panic!("expected DigestMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_put_verified_mismatch_still_persists() {
        let (_, blobs) = store();
        let wrong = Digest::compute(b"something else");
        let err = blobs
            .put_verified(Bytes::from_static(b"payload"), &wrong)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DigestMismatch { .. }));

        // The blob exists under its actual digest regardless.
        let actual = Digest::compute(b"payload");
        assert!(blobs.has(&actual).await.unwrap());
    }
}
