//! Client-side cache filled by bulk gets.
//!
//! A miss issues one bulk get rooted at the missing digest with depth 10,
//! so a single round trip warms the cache with the whole reachable subtree.

use async_trait::async_trait;
use bytes::Bytes;
use cairn_core::api::{GetRequest, GetRequestItem, NodeId};
use cairn_core::{DIGEST_KEY_LEN, Digest, Link};
use cairn_store::{ObjectRead, StoreError, StoreResult};
use dashmap::DashMap;
use std::sync::Arc;

use crate::remote::RemoteStore;

const FILL_DEPTH: u32 = 10;

/// Bulk-fill cache over a remote store.
pub struct ClientCache {
    cache: DashMap<[u8; DIGEST_KEY_LEN], Bytes>,
    inner: Arc<RemoteStore>,
}

impl ClientCache {
    pub fn new(inner: Arc<RemoteStore>) -> Self {
        Self {
            cache: DashMap::new(),
            inner,
        }
    }

    /// Number of cached blobs; diagnostics only.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    async fn fill(&self, digest: &Digest) {
        let req = GetRequest {
            items: vec![GetRequestItem {
                node_id: NodeId {
                    root: Link::dag(digest.clone()),
                    path: Vec::new(),
                },
                depth: FILL_DEPTH,
            }],
        };
        let res = match self.inner.get_nodes(&req).await {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!(%digest, error = %e, "cache fill failed");
                return;
            }
        };
        tracing::debug!(%digest, blobs = res.items.len(), "cache filled from remote");
        for (text, blob) in res.items {
            let blob_digest = match Digest::parse(&text) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(text, error = %e, "skipping blob with bad digest key");
                    continue;
                }
            };
            // The response keys are server-asserted; re-derive before trusting.
            let actual = Digest::compute_with(blob_digest.codec(), &blob.0);
            if actual != blob_digest {
                tracing::warn!(text, "skipping blob failing verification");
                continue;
            }
            self.cache.insert(blob_digest.to_key(), Bytes::from(blob.0));
        }
    }
}

#[async_trait]
impl ObjectRead for ClientCache {
    async fn get(&self, digest: &Digest) -> StoreResult<Bytes> {
        if let Some(entry) = self.cache.get(&digest.to_key()) {
            tracing::debug!(%digest, "cache hit");
            return Ok(entry.value().clone());
        }
        self.fill(digest).await;
        match self.cache.get(&digest.to_key()) {
            Some(entry) => Ok(entry.value().clone()),
            None => Err(StoreError::NotFound(digest.to_string())),
        }
    }

    async fn has(&self, digest: &Digest) -> StoreResult<bool> {
        if self.cache.contains_key(&digest.to_key()) {
            return Ok(true);
        }
        self.fill(digest).await;
        Ok(self.cache.contains_key(&digest.to_key()))
    }
}
