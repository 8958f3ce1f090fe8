//! Object storage backend abstraction (S3/MinIO/local filesystem/memory).

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::{BlobStoreError, Result};

const DATA_PREFIX: &str = "data";

/// Configuration for the object storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStoreConfig {
    /// In-memory storage, lost on restart
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        access_key: String,
        secret_key: String,
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

/// Thin wrapper that lays blobs out under `data/<content key>`.
#[derive(Debug, Clone)]
pub(crate) struct Storage {
    inner: Arc<dyn ObjectStore>,
}

impl Storage {
    pub async fn new(config: &ObjectStoreConfig) -> Result<Self> {
        let inner: Arc<dyn ObjectStore> = match config {
            ObjectStoreConfig::Memory => Arc::new(InMemory::new()),

            ObjectStoreConfig::Local { path } => {
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| BlobStoreError::InvalidConfig(e.to_string()))?,
                )
            }

            ObjectStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let store: Arc<dyn ObjectStore> = Arc::new(
                    AmazonS3Builder::new()
                        .with_endpoint(endpoint)
                        .with_access_key_id(access_key)
                        .with_secret_access_key(secret_key)
                        .with_bucket_name(bucket)
                        .with_region(region.as_deref().unwrap_or("us-east-1"))
                        .with_allow_http(endpoint.starts_with("http://"))
                        .build()
                        .map_err(|e| BlobStoreError::InvalidConfig(e.to_string()))?,
                );
                ensure_bucket_exists(store.as_ref(), bucket).await?;
                store
            }
        };

        Ok(Self { inner })
    }

    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    fn data_path(content_key: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", DATA_PREFIX, content_key))
    }

    pub async fn put_data(&self, content_key: &str, data: Bytes) -> Result<()> {
        let path = Self::data_path(content_key);
        self.inner.put(&path, data.into()).await?;
        Ok(())
    }

    pub async fn get_data(&self, content_key: &str) -> Result<Option<Bytes>> {
        let path = Self::data_path(content_key);
        match self.inner.get(&path).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn has_data(&self, content_key: &str) -> Result<bool> {
        let path = Self::data_path(content_key);
        match self.inner.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_data(&self, content_key: &str) -> Result<()> {
        let path = Self::data_path(content_key);
        // already gone counts as deleted
        match self.inner.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_content_keys(&self) -> Result<Vec<String>> {
        let prefix = ObjectPath::from(DATA_PREFIX);
        let items: Vec<_> = self.inner.list(Some(&prefix)).try_collect().await?;

        Ok(items
            .into_iter()
            .filter_map(|meta| meta.location.filename().map(str::to_string))
            .collect())
    }
}

/// Fail fast at startup when the configured bucket is missing.
async fn ensure_bucket_exists(store: &dyn ObjectStore, bucket: &str) -> Result<()> {
    let prefix = ObjectPath::from("");
    let mut stream = store.list(Some(&prefix));
    match stream.try_next().await {
        Ok(_) => Ok(()),
        Err(object_store::Error::NotFound { .. }) => {
            Err(BlobStoreError::BucketNotFound(bucket.to_string()))
        }
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("NoSuchBucket") {
                return Err(BlobStoreError::BucketNotFound(bucket.to_string()));
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = Storage::memory();
        let data = Bytes::from("hello world");

        storage.put_data("abc123", data.clone()).await.unwrap();
        assert_eq!(storage.get_data("abc123").await.unwrap().unwrap(), data);
        assert!(storage.has_data("abc123").await.unwrap());
        assert_eq!(storage.list_content_keys().await.unwrap(), vec!["abc123"]);

        storage.delete_data("abc123").await.unwrap();
        assert!(!storage.has_data("abc123").await.unwrap());
        assert!(storage.get_data("abc123").await.unwrap().is_none());

        // deleting twice is fine
        storage.delete_data("abc123").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_storage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ObjectStoreConfig::Local {
            path: temp_dir.path().join("blobs"),
        };
        let storage = Storage::new(&config).await.unwrap();

        let data = Bytes::from("test data");
        storage.put_data("def456", data.clone()).await.unwrap();
        assert_eq!(storage.get_data("def456").await.unwrap().unwrap(), data);

        let file_path = temp_dir.path().join("blobs").join("data").join("def456");
        assert!(file_path.exists());
    }
}
