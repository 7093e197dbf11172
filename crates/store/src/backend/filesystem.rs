//! Local filesystem datastore: one file per key under a root directory.

use crate::backend::KvStore;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Filesystem-backed key/value store.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Resolve a key to a path inside the root. Keys are flat names (digest
    /// text forms); anything that could traverse the directory tree is
    /// rejected.
    fn key_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || key.starts_with('.')
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl KvStore for FsStore {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let path = self.key_path(key)?;
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self, value), fields(backend = "filesystem", size = value.len()))]
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        let path = self.key_path(key)?;

        // Write to a uniquely named temp file, fsync, then rename so a
        // concurrent reader never observes a partial blob.
        let temp_path = self.root.join(format!(".tmp.{}", Uuid::new_v4()));
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&value).await?;
            file.sync_all().await?;
        }
        fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn has(&self, key: &str) -> StoreResult<bool> {
        let path = self.key_path(key)?;
        fs::try_exists(&path).await.map_err(StoreError::Io)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
