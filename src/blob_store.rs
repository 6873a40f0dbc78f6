//! Content-addressed storage for evidence bytes
//!
//! Evidence binaries are stored by reference: the relational rows carry a
//! `sha256-…` locator and the bytes live here, one file per blob, spread
//! across subdirectories by hash prefix. Storing the same bytes twice is a
//! no-op, so a resubmitted photo costs nothing extra.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::RegistryError;

/// Result of storing evidence bytes
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// `sha256-…` locator recorded in the evidence row
    pub locator: String,
    pub size_bytes: u64,
    pub already_existed: bool,
}

/// Evidence blob store rooted at a directory
pub struct BlobStore {
    root_dir: PathBuf,
}

impl BlobStore {
    pub async fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self, RegistryError> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir).await?;

        info!(path = %root_dir.display(), "Initialized evidence blob store");
        Ok(Self { root_dir })
    }

    /// Compute the locator for a byte slice
    pub fn compute_locator(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("sha256-{}", hex::encode(hasher.finalize()))
    }

    fn blob_path(&self, locator: &str) -> PathBuf {
        let hash_part = locator.strip_prefix("sha256-").unwrap_or(locator);
        let subdir = &hash_part[..4.min(hash_part.len())];
        self.root_dir.join(subdir).join(locator)
    }

    /// Store evidence bytes, returning the locator
    pub async fn store(&self, data: &[u8]) -> Result<StoredBlob, RegistryError> {
        let locator = Self::compute_locator(data);
        let path = self.blob_path(&locator);

        if fs::metadata(&path).await.is_ok() {
            debug!(locator = %locator, "Blob already exists");
            return Ok(StoredBlob {
                locator,
                size_bytes: data.len() as u64,
                already_existed: true,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;

        debug!(locator = %locator, size = data.len(), "Stored evidence blob");
        Ok(StoredBlob {
            locator,
            size_bytes: data.len() as u64,
            already_existed: false,
        })
    }

    pub async fn exists(&self, locator: &str) -> bool {
        fs::metadata(self.blob_path(locator)).await.is_ok()
    }

    /// Retrieve evidence bytes, verifying them against the locator
    pub async fn get(&self, locator: &str) -> Result<Vec<u8>, RegistryError> {
        let path = self.blob_path(locator);
        if fs::metadata(&path).await.is_err() {
            return Err(RegistryError::BlobNotFound(locator.to_string()));
        }

        let data = fs::read(&path).await?;
        let actual = Self::compute_locator(&data);
        if actual != locator {
            return Err(RegistryError::HashMismatch {
                expected: locator.to_string(),
                actual,
            });
        }
        Ok(data)
    }

    pub async fn delete(&self, locator: &str) -> Result<(), RegistryError> {
        fs::remove_file(self.blob_path(locator)).await.ok();
        Ok(())
    }

    /// Count and total size of stored blobs
    pub async fn stats(&self) -> Result<BlobStats, RegistryError> {
        let mut total_blobs = 0u64;
        let mut total_bytes = 0u64;

        if let Ok(mut subdirs) = fs::read_dir(&self.root_dir).await {
            while let Ok(Some(subdir)) = subdirs.next_entry().await {
                if !subdir.path().is_dir() {
                    continue;
                }
                if let Ok(mut entries) = fs::read_dir(subdir.path()).await {
                    while let Ok(Some(entry)) = entries.next_entry().await {
                        if let Ok(metadata) = fs::metadata(entry.path()).await {
                            total_blobs += 1;
                            total_bytes += metadata.len();
                        }
                    }
                }
            }
        }

        Ok(BlobStats {
            total_blobs,
            total_bytes,
        })
    }
}

/// Blob store statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct BlobStats {
    pub total_blobs: u64,
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::new(temp_dir.path()).await.unwrap();

        let data = b"mangrove site photo bytes";
        let stored = store.store(data).await.unwrap();

        assert!(stored.locator.starts_with("sha256-"));
        assert_eq!(stored.size_bytes, data.len() as u64);
        assert!(!stored.already_existed);

        let retrieved = store.get(&stored.locator).await.unwrap();
        assert_eq!(retrieved, data);
    }

    #[tokio::test]
    async fn test_idempotent_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::new(temp_dir.path()).await.unwrap();

        let first = store.store(b"same bytes").await.unwrap();
        let second = store.store(b"same bytes").await.unwrap();

        assert_eq!(first.locator, second.locator);
        assert!(!first.already_existed);
        assert!(second.already_existed);
    }

    #[tokio::test]
    async fn test_get_missing_blob() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::new(temp_dir.path()).await.unwrap();

        let locator = BlobStore::compute_locator(b"never stored");
        assert!(matches!(
            store.get(&locator).await,
            Err(RegistryError::BlobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_counts_blobs() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::new(temp_dir.path()).await.unwrap();

        store.store(b"one").await.unwrap();
        store.store(b"two").await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_blobs, 2);
        assert_eq!(stats.total_bytes, 6);
    }

    #[test]
    fn test_locator_format() {
        let locator = BlobStore::compute_locator(b"test");
        assert!(locator.starts_with("sha256-"));
        assert_eq!(locator.len(), 7 + 64);
    }
}
