//! File storage for memory attachments.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

/// Stores attachment bytes and hands back an opaque locator.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores the bytes and returns a locator for later retrieval.
    async fn put(&self, bytes: &[u8], filename: &str) -> Result<String, anyhow::Error>;

    async fn get(&self, locator: &str) -> Result<Vec<u8>, anyhow::Error>;

    /// Removes the stored file. Removing an absent locator is a no-op.
    async fn remove(&self, locator: &str) -> Result<(), anyhow::Error>;
}

/// Local-disk store under a single upload directory. Locators are file
/// paths; a uuid prefix keeps colliding filenames apart.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, bytes: &[u8], filename: &str) -> Result<String, anyhow::Error> {
        tokio::fs::create_dir_all(&self.root).await?;
        let stored_name = format!("{}_{}", Uuid::new_v4().simple(), filename);
        let path = self.root.join(stored_name);
        tokio::fs::write(&path, bytes).await?;
        let locator = path.to_string_lossy().into_owned();
        info!(locator = %locator, size = bytes.len(), "file stored");
        Ok(locator)
    }

    async fn get(&self, locator: &str) -> Result<Vec<u8>, anyhow::Error> {
        Ok(tokio::fs::read(locator).await?)
    }

    async fn remove(&self, locator: &str) -> Result<(), anyhow::Error> {
        match tokio::fs::remove_file(locator).await {
            Ok(()) => {
                debug!(locator = %locator, "file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
