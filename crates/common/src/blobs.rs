use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// Byte storage addressed by content key.
///
/// Deleting a key that does not exist succeeds.
#[async_trait]
pub trait BlobStorage: Send + Sync + Debug + Clone + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn put(&self, content_key: &str, data: Bytes) -> Result<(), Self::Error>;

    async fn get(&self, content_key: &str) -> Result<Option<Bytes>, Self::Error>;

    async fn delete(&self, content_key: &str) -> Result<(), Self::Error>;
}

#[async_trait]
impl BlobStorage for object_store::BlobStore {
    type Error = object_store::BlobStoreError;

    async fn put(&self, content_key: &str, data: Bytes) -> Result<(), Self::Error> {
        object_store::BlobStore::put(self, content_key, data).await
    }

    async fn get(&self, content_key: &str) -> Result<Option<Bytes>, Self::Error> {
        object_store::BlobStore::get(self, content_key).await
    }

    async fn delete(&self, content_key: &str) -> Result<(), Self::Error> {
        object_store::BlobStore::delete(self, content_key).await
    }
}
