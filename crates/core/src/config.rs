//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:27333").
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Maximum request body size for the bulk JSON APIs, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Default recursion depth for bulk gets that omit one.
    #[serde(default = "default_fetch_depth")]
    pub fetch_depth: u32,
    /// Read timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Write timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub write_timeout_secs: u64,
}

fn default_listen() -> String {
    "127.0.0.1:27333".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_fetch_depth() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: default_max_body_bytes(),
            fetch_depth: default_fetch_depth(),
            read_timeout_secs: default_timeout_secs(),
            write_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Blob datastore backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage, one file per blob.
    Filesystem {
        /// Root directory for blobs.
        path: PathBuf,
    },
    /// S3-compatible storage, one object per blob in a single bucket.
    S3 {
        bucket: String,
        region: Option<String>,
        /// Optional endpoint URL (for MinIO, etc.).
        endpoint: Option<String>,
    },
    /// In-memory map; for tests and ephemeral deployments.
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/objects"),
        }
    }
}

/// In-process blob cache configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the write-through read cache in front of the backing store.
    #[serde(default)]
    pub enabled: bool,
}

/// Tag registry entry-store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegistryConfig {
    /// One JSON document per entry under a directory.
    Filesystem { path: PathBuf },
    /// In-memory entries; for tests and ephemeral deployments.
    Memory,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/tags"),
        }
    }
}

/// One principal, keyed by an opaque API key. The principal table is built
/// at startup and never mutated at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: u64,
    pub name: String,
    pub api_key: String,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
}

/// A remote store to layer reads over, tried in listed order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub name: String,
    pub url: String,
    pub api_key: Option<String>,
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
    #[serde(default)]
    pub upstreams: Vec<UpstreamConfig>,
}

impl AppConfig {
    /// Create a test configuration with in-memory storage, one read-write
    /// principal and one read-only principal.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            storage: StorageConfig::Memory,
            registry: RegistryConfig::Memory,
            users: vec![
                UserConfig {
                    id: 1,
                    name: "writer".to_string(),
                    api_key: "test-rw-key".to_string(),
                    can_read: true,
                    can_write: true,
                },
                UserConfig {
                    id: 2,
                    name: "reader".to_string(),
                    api_key: "test-ro-key".to_string(),
                    can_read: true,
                    can_write: false,
                },
                UserConfig {
                    id: 3,
                    name: "uploader".to_string(),
                    api_key: "test-wo-key".to_string(),
                    can_read: false,
                    can_write: true,
                },
            ],
            ..Default::default()
        }
    }
}
