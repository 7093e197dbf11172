//! Append-only map-entry stores.

use crate::error::{RegistryError, RegistryResult};
use crate::tag::MapEntry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use uuid::Uuid;

/// Persistence for registry entries. Entries are only ever appended; the
/// read side filters by `(public key, label)`.
#[async_trait]
pub trait EntryStore: Send + Sync + 'static {
    async fn append(&self, entry: MapEntry) -> RegistryResult<()>;
    async fn find(&self, public_key: &[u8], label: &str) -> RegistryResult<Vec<MapEntry>>;
}

/// In-memory entries for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryEntries {
    entries: Mutex<Vec<MapEntry>>,
}

impl MemoryEntries {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for MemoryEntries {
    async fn append(&self, entry: MapEntry) -> RegistryResult<()> {
        self.entries
            .lock()
            .expect("entry store lock poisoned")
            .push(entry);
        Ok(())
    }

    async fn find(&self, public_key: &[u8], label: &str) -> RegistryResult<Vec<MapEntry>> {
        Ok(self
            .entries
            .lock()
            .expect("entry store lock poisoned")
            .iter()
            .filter(|e| e.public_key == public_key && e.label == label)
            .cloned()
            .collect())
    }
}

/// One JSON document per entry under a directory.
pub struct FsEntries {
    root: PathBuf,
}

impl FsEntries {
    pub async fn new(root: impl AsRef<Path>) -> RegistryResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }
}

#[async_trait]
impl EntryStore for FsEntries {
    async fn append(&self, entry: MapEntry) -> RegistryResult<()> {
        let doc = serde_json::to_vec(&entry)?;
        let path = self.root.join(format!("{}.json", Uuid::new_v4()));
        fs::write(&path, doc).await?;
        Ok(())
    }

    async fn find(&self, public_key: &[u8], label: &str) -> RegistryResult<Vec<MapEntry>> {
        let mut out = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(dirent) = dir.next_entry().await? {
            if dirent.path().extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let data = fs::read(dirent.path()).await?;
            let entry: MapEntry = serde_json::from_slice(&data).map_err(|e| {
                RegistryError::InvalidEntry(format!("{}: {e}", dirent.path().display()))
            })?;
            if entry.public_key == public_key && entry.label == label {
                out.push(entry);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::Digest;
    use time::OffsetDateTime;

    fn entry(label: &str, seconds: i64) -> MapEntry {
        MapEntry {
            public_key: vec![9, 9],
            label: label.to_string(),
            target: Digest::compute(label.as_bytes()).to_wire(),
            signature: vec![1],
            creation_time: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(seconds),
            client_ip: None,
            request_bytes: None,
        }
    }

    #[tokio::test]
    async fn test_memory_append_and_find() {
        let store = MemoryEntries::new();
        store.append(entry("a", 0)).await.unwrap();
        store.append(entry("a", 1)).await.unwrap();
        store.append(entry("b", 2)).await.unwrap();

        assert_eq!(store.find(&[9, 9], "a").await.unwrap().len(), 2);
        assert_eq!(store.find(&[9, 9], "b").await.unwrap().len(), 1);
        assert!(store.find(&[0], "a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fs_append_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsEntries::new(dir.path()).await.unwrap();
        store.append(entry("head", 5)).await.unwrap();
        store.append(entry("head", 6)).await.unwrap();

        let found = store.find(&[9, 9], "head").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(store.find(&[9, 9], "other").await.unwrap().is_empty());
    }
}
