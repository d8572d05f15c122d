//! Blob store boundary
//!
//! Used for exactly one thing: the per-stack bootstrap bundle. Content is
//! opaque bytes to everything behind this trait.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Opaque key/value blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob. `NotFound` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Write a blob, replacing any existing content.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Delete a blob. Deleting an absent key returns `NotFound`.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Filesystem-backed blob store
///
/// Keys may contain `/` separators, which map to subdirectories under the
/// root.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(CloudError::NotFound(format!("blob {key}")));
        }
        let bytes = fs::read(&path).await?;
        tracing::debug!("read blob {} ({} bytes)", key, bytes.len());
        Ok(bytes)
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        tracing::debug!("wrote blob {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(CloudError::NotFound(format!("blob {key}")));
        }
        fs::remove_file(&path).await?;
        tracing::debug!("deleted blob {}", key);
        Ok(())
    }
}
