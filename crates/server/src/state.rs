//! Application state shared across handlers.
//!
//! All process-wide state is assembled once at startup into one immutable
//! [`ServiceContext`] value and passed to handlers explicitly; nothing in it
//! is mutated at runtime apart from the interior of the blob cache.

use crate::access_log::{AccessLog, MemoryAccessLog, TracingAccessLog};
use crate::auth::{Principal, principal_table};
use cairn_core::config::AppConfig;
use cairn_registry::{MemoryEntries, Registry};
use cairn_store::{BlobStore, CachedStore, MemoryStore, ObjectRead, ObjectWrite};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct ServiceContext {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Content-addressed blob store (possibly cache-fronted).
    pub store: Arc<dyn ObjectWrite>,
    /// Signed tag registry.
    pub registry: Arc<Registry>,
    /// API key → principal table.
    pub users: Arc<HashMap<String, Principal>>,
    /// Access record sink.
    pub access_log: Arc<dyn AccessLog>,
}

impl ServiceContext {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ObjectWrite>,
        registry: Arc<Registry>,
        access_log: Arc<dyn AccessLog>,
    ) -> Self {
        let users = Arc::new(principal_table(&config.users));
        Self {
            config: Arc::new(config),
            store,
            registry,
            users,
            access_log,
        }
    }

    /// Assemble the full service from configuration: datastore backend,
    /// content addressing, optional cache tier, registry, tracing log sink.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let backend = cairn_store::from_config(&config.storage).await?;
        tracing::info!(backend = backend.backend_name(), "storage backend initialized");

        let blobs = BlobStore::new(backend);
        let store: Arc<dyn ObjectWrite> = if config.cache.enabled {
            tracing::info!("blob cache enabled");
            Arc::new(CachedStore::new(Arc::new(blobs)))
        } else {
            Arc::new(blobs)
        };

        let entries = cairn_registry::from_config(&config.registry).await?;
        let registry = Arc::new(Registry::new(entries));

        Ok(Self::new(config, store, registry, Arc::new(TracingAccessLog)))
    }

    /// The store narrowed to its read capability.
    pub fn reader(&self) -> &dyn ObjectRead {
        self.store.as_ref()
    }

    /// In-memory context plus a handle on the recorded access log.
    ///
    /// **For testing only.**
    pub fn for_testing() -> (Self, Arc<MemoryAccessLog>) {
        let config = AppConfig::for_testing();
        let store = Arc::new(BlobStore::new(Arc::new(MemoryStore::new())));
        let registry = Arc::new(Registry::new(Arc::new(MemoryEntries::new())));
        let access_log = Arc::new(MemoryAccessLog::new());
        let ctx = Self::new(config, store, registry, access_log.clone());
        (ctx, access_log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::config::{RegistryConfig, StorageConfig};

    #[tokio::test]
    async fn test_from_config_memory_stack() {
        let config = AppConfig {
            storage: StorageConfig::Memory,
            registry: RegistryConfig::Memory,
            ..Default::default()
        };
        let ctx = ServiceContext::from_config(config).await.unwrap();
        assert!(ctx.users.is_empty());
    }

    #[tokio::test]
    async fn test_for_testing_has_both_principals() {
        let (ctx, _) = ServiceContext::for_testing();
        assert_eq!(ctx.users.len(), 3);
        assert!(ctx.users.contains_key("test-rw-key"));
        assert!(ctx.users.contains_key("test-ro-key"));
        assert!(ctx.users.contains_key("test-wo-key"));
    }
}
