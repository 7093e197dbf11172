//! Layered read-through over an ordered list of named readers.

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectRead, ObjectWrite};
use async_trait::async_trait;
use bytes::Bytes;
use cairn_core::Digest;
use std::sync::Arc;
use std::time::Instant;

/// One tier of a [`Sequence`].
#[derive(Clone)]
pub struct Tier {
    pub name: String,
    pub reader: Arc<dyn ObjectRead>,
}

impl Tier {
    pub fn new(name: impl Into<String>, reader: Arc<dyn ObjectRead>) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

/// Tries each tier in order and returns the first success.
#[derive(Clone, Default)]
pub struct Sequence {
    tiers: Vec<Tier>,
}

impl Sequence {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }
}

#[async_trait]
impl ObjectRead for Sequence {
    async fn get(&self, digest: &Digest) -> StoreResult<Bytes> {
        for tier in &self.tiers {
            let start = Instant::now();
            match tier.reader.get(digest).await {
                Ok(bytes) => {
                    tracing::info!(
                        %digest,
                        tier = %tier.name,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "fetched from tier"
                    );
                    return Ok(bytes);
                }
                Err(StoreError::NotFound(_)) => {
                    tracing::debug!(%digest, tier = %tier.name, "not found in tier");
                }
                Err(e) => {
                    tracing::error!(%digest, tier = %tier.name, error = %e, "tier get failed");
                }
            }
        }
        Err(StoreError::NotFound(digest.to_string()))
    }

    async fn has(&self, digest: &Digest) -> StoreResult<bool> {
        for tier in &self.tiers {
            match tier.reader.has(digest).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(%digest, tier = %tier.name, error = %e, "tier has failed");
                }
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl ObjectWrite for Sequence {
    async fn put(&self, _bytes: Bytes) -> StoreResult<Digest> {
        Err(StoreError::NotImplemented("put on a layered reader"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::object::BlobStore;

    fn blob_store() -> Arc<BlobStore> {
        Arc::new(BlobStore::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn test_first_tier_with_the_blob_wins() {
        let near = blob_store();
        let far = blob_store();
        let digest = far.put(Bytes::from_static(b"remote blob")).await.unwrap();

        let seq = Sequence::new(vec![
            Tier::new("near", near.clone()),
            Tier::new("far", far.clone()),
        ]);
        assert_eq!(
            seq.get(&digest).await.unwrap(),
            Bytes::from_static(b"remote blob")
        );
        assert!(seq.has(&digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_absent_everywhere() {
        let seq = Sequence::new(vec![Tier::new("only", blob_store())]);
        let digest = Digest::compute(b"nowhere");
        assert!(matches!(
            seq.get(&digest).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(!seq.has(&digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_is_not_supported() {
        let seq = Sequence::new(vec![]);
        assert!(matches!(
            seq.put(Bytes::from_static(b"x")).await,
            Err(StoreError::NotImplemented(_))
        ));
    }
}
