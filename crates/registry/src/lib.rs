//! Signed mutable-label registry for the cairn store.
//!
//! Maps `(ECDSA-P256 public key, label)` pairs to a current target digest.
//! Updates are authenticated by an ASN.1-DER signature over the canonical
//! serialization of the tag; entries are append-only and the newest
//! `creation_time` wins at read time.

pub mod entries;
pub mod error;
pub mod registry;
pub mod tag;

pub use entries::{EntryStore, FsEntries, MemoryEntries};
pub use error::{RegistryError, RegistryResult};
pub use registry::{Registry, generate_key, sign_tag, verify_signed_tag};
pub use tag::{
    GetTagRequest, GetTagResponse, MapEntry, SetTagRequest, SetTagResponse, SignedTag, Tag,
};

use cairn_core::config::RegistryConfig;
use std::sync::Arc;

/// Create an entry store from configuration.
pub async fn from_config(config: &RegistryConfig) -> RegistryResult<Arc<dyn EntryStore>> {
    match config {
        RegistryConfig::Filesystem { path } => {
            let store = FsEntries::new(path).await?;
            Ok(Arc::new(store))
        }
        RegistryConfig::Memory => Ok(Arc::new(MemoryEntries::new())),
    }
}
