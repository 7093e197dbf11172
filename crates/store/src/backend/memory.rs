//! In-memory datastore for tests and ephemeral deployments.

use crate::backend::KvStore;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

/// Concurrent in-memory key/value store.
#[derive(Default)]
pub struct MemoryStore {
    inner: DashMap<String, Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.inner
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.inner.insert(key.to_string(), value);
        Ok(())
    }

    async fn has(&self, key: &str) -> StoreResult<bool> {
        Ok(self.inner.contains_key(key))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
