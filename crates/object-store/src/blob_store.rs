//! BlobStore - content-keyed byte storage for catalogued files.

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{BlobStoreError, Result};
use crate::storage::{ObjectStoreConfig, Storage};

/// Stores file contents under opaque content keys.
///
/// Keys are generated by the caller and never derived from the data, so the
/// same bytes uploaded twice occupy two keys.
#[derive(Debug, Clone)]
pub struct BlobStore {
    storage: Storage,
}

impl BlobStore {
    pub async fn new(config: &ObjectStoreConfig) -> Result<Self> {
        let storage = Storage::new(config).await?;
        Ok(Self { storage })
    }

    /// Create a fully ephemeral store.
    pub fn in_memory() -> Self {
        Self {
            storage: Storage::memory(),
        }
    }

    pub async fn put(&self, content_key: &str, data: Bytes) -> Result<()> {
        validate_content_key(content_key)?;
        let size = data.len();
        self.storage.put_data(content_key, data).await?;
        debug!(content_key, size, "blob stored");
        Ok(())
    }

    pub async fn get(&self, content_key: &str) -> Result<Option<Bytes>> {
        validate_content_key(content_key)?;
        self.storage.get_data(content_key).await
    }

    pub async fn has(&self, content_key: &str) -> Result<bool> {
        validate_content_key(content_key)?;
        self.storage.has_data(content_key).await
    }

    /// Delete a blob. Deleting a missing blob succeeds.
    pub async fn delete(&self, content_key: &str) -> Result<()> {
        validate_content_key(content_key)?;
        self.storage.delete_data(content_key).await?;
        info!(content_key, "blob deleted");
        Ok(())
    }

    /// All content keys currently holding data.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.storage.list_content_keys().await
    }
}

fn validate_content_key(content_key: &str) -> Result<()> {
    let valid = !content_key.is_empty()
        && content_key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(BlobStoreError::InvalidContentKey(content_key.to_string()));
    }
    Ok(())
}
