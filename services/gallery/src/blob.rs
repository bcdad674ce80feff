//! Durable blob storage for uploaded photo bytes
//!
//! Blobs are addressed by their stored name. Writes never overwrite: a name
//! that is already taken fails with `StorageConflict`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{GalleryError, GalleryResult};

/// Storage for photo bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a new blob; fails with `StorageConflict` if the name exists
    async fn write(&self, name: &str, bytes: &[u8]) -> GalleryResult<()>;

    /// Read a blob, `None` if absent
    async fn read(&self, name: &str) -> GalleryResult<Option<Vec<u8>>>;

    /// Remove a blob; removing an absent blob succeeds
    async fn remove(&self, name: &str) -> GalleryResult<()>;

    /// Whether a blob exists
    async fn exists(&self, name: &str) -> GalleryResult<bool> {
        Ok(self.read(name).await?.is_some())
    }
}

/// Blob store on a local directory
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Use `root` as the blob directory, creating it if needed
    pub async fn open(root: impl AsRef<Path>) -> GalleryResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            GalleryError::Internal(format!(
                "Failed to create upload directory {}: {}",
                root.display(),
                e
            ))
        })?;

        info!("Blob store rooted at {}", root.display());
        Ok(Self { root })
    }

    fn path_for(&self, name: &str) -> GalleryResult<PathBuf> {
        let plain = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\', '\0'])
            && !name.contains("..");

        if !plain {
            return Err(GalleryError::InvalidInput(format!(
                "Invalid stored name: {:?}",
                name
            )));
        }

        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, name: &str, bytes: &[u8]) -> GalleryResult<()> {
        let path = self.path_for(name)?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(GalleryError::StorageConflict(name.to_string()));
            }
            Err(source) => {
                return Err(GalleryError::StorageWrite {
                    name: name.to_string(),
                    source,
                });
            }
        };

        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(source) = written {
            drop(file);
            if let Err(e) = fs::remove_file(&path).await {
                warn!("Failed to clean up partial blob {}: {}", name, e);
            }
            return Err(GalleryError::StorageWrite {
                name: name.to_string(),
                source,
            });
        }

        Ok(())
    }

    async fn read(&self, name: &str) -> GalleryResult<Option<Vec<u8>>> {
        let path = self.path_for(name)?;

        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GalleryError::Internal(format!(
                "Failed to read blob {}: {}",
                name, e
            ))),
        }
    }

    async fn remove(&self, name: &str) -> GalleryResult<()> {
        let path = self.path_for(name)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(GalleryError::StorageRemove {
                name: name.to_string(),
                source,
            }),
        }
    }

    async fn exists(&self, name: &str) -> GalleryResult<bool> {
        let path = self.path_for(name)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| GalleryError::Internal(format!("Failed to stat blob {}: {}", name, e)))
    }
}
