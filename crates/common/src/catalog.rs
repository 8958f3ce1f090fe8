use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blobs::BlobStorage;
use crate::error::{Result, StashError};
use crate::store::{FileInsert, StorageProvider};

/// Maps a content key to a display name inside a folder.
///
/// The effective owner of a record is the owner of its folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub folder_id: Uuid,
    pub display_name: String,
    pub content_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    pub folder_id: Uuid,
    pub display_name: String,
    pub content_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub record: FileRecord,
    pub owner_account_id: Uuid,
    pub owner_login_name: String,
}

#[derive(Debug, Clone)]
pub struct FileCatalog<P, B> {
    provider: P,
    blobs: B,
}

impl<P: StorageProvider, B: BlobStorage> FileCatalog<P, B> {
    pub fn new(provider: P, blobs: B) -> Self {
        Self { provider, blobs }
    }

    /// Record `content_key` under `folder_id`. Fails with `Forbidden` unless
    /// the folder exists and belongs to `owner_account_id`; the check and the
    /// insert happen as one provider call.
    pub async fn save_metadata(
        &self,
        owner_account_id: Uuid,
        folder_id: Uuid,
        display_name: &str,
        content_key: &str,
    ) -> Result<FileRecord> {
        validate_display_name(display_name)?;
        if content_key.is_empty() {
            return Err(StashError::bad_request("content key cannot be empty"));
        }

        let new_record = NewFileRecord {
            folder_id,
            display_name: display_name.to_string(),
            content_key: content_key.to_string(),
        };
        let inserted = self
            .provider
            .insert_file(owner_account_id, &new_record)
            .await
            .map_err(|e| StashError::internal("failed to insert file record", e))?;

        match inserted {
            FileInsert::Inserted(record) => {
                tracing::debug!(
                    owner = %owner_account_id,
                    folder_id = %folder_id,
                    content_key,
                    "recorded file"
                );
                Ok(record)
            }
            FileInsert::FolderNotOwned => Err(StashError::Forbidden),
            FileInsert::DuplicateContentKey => Err(StashError::conflict(format!(
                "content key {} is already catalogued",
                content_key
            ))),
        }
    }

    pub async fn resolve(&self, content_key: &str) -> Result<ResolvedFile> {
        self.provider
            .resolve_file(content_key)
            .await
            .map_err(|e| StashError::internal("failed to resolve file", e))?
            .ok_or_else(|| StashError::not_found(format!("file {}", content_key)))
    }

    pub async fn view(&self, requester_login: &str, content_key: &str) -> Result<FileRecord> {
        let resolved = self.resolve(content_key).await?;
        if resolved.owner_login_name != requester_login {
            return Err(StashError::Forbidden);
        }
        Ok(resolved.record)
    }

    /// [`FileCatalog::view`] followed by reading the bytes.
    pub async fn read(&self, requester_login: &str, content_key: &str) -> Result<(FileRecord, Bytes)> {
        let record = self.view(requester_login, content_key).await?;
        let data = self
            .blobs
            .get(content_key)
            .await
            .map_err(|e| StashError::internal("failed to read blob", e))?;

        match data {
            Some(data) => Ok((record, data)),
            None => {
                tracing::warn!(content_key, "catalogued file has no blob");
                Err(StashError::not_found(format!("content for file {}", content_key)))
            }
        }
    }

    /// Remove the record, then the blob. A failed blob delete restores the
    /// record so the catalog never points at missing bytes it believes gone,
    /// nor keeps a row for bytes already released.
    pub async fn delete(&self, requester_login: &str, content_key: &str) -> Result<()> {
        self.view(requester_login, content_key).await?;

        let removed = self
            .provider
            .delete_file(content_key)
            .await
            .map_err(|e| StashError::internal("failed to delete file record", e))?
            .ok_or_else(|| StashError::not_found(format!("file {}", content_key)))?;

        if let Err(e) = self.blobs.delete(content_key).await {
            tracing::error!(error = %e, content_key, "failed to delete blob, restoring file record");
            if let Err(restore) = self.provider.restore_file(&removed).await {
                tracing::error!(error = %restore, content_key, "failed to restore file record");
            }
            return Err(StashError::Internal);
        }

        tracing::info!(content_key, requester = requester_login, "deleted file");
        Ok(())
    }

    /// Store `data` under a fresh content key and catalogue it. The blob is
    /// released again if the catalogue rejects the record.
    pub async fn store(
        &self,
        owner_account_id: Uuid,
        folder_id: Uuid,
        display_name: &str,
        data: Bytes,
    ) -> Result<FileRecord> {
        validate_display_name(display_name)?;

        let content_key = Uuid::new_v4().to_string();
        let size = data.len();
        self.blobs
            .put(&content_key, data)
            .await
            .map_err(|e| StashError::internal("failed to write blob", e))?;

        match self
            .save_metadata(owner_account_id, folder_id, display_name, &content_key)
            .await
        {
            Ok(record) => {
                tracing::info!(content_key = %content_key, size, "stored file");
                Ok(record)
            }
            Err(err) => {
                if let Err(e) = self.blobs.delete(&content_key).await {
                    tracing::warn!(error = %e, content_key = %content_key, "failed to release orphaned blob");
                }
                Err(err)
            }
        }
    }

    /// Best-effort release of blobs whose records are already gone.
    pub async fn release_blobs(&self, content_keys: &[String]) {
        for content_key in content_keys {
            if let Err(e) = self.blobs.delete(content_key).await {
                tracing::warn!(error = %e, content_key = %content_key, "failed to release blob");
            }
        }
    }
}

fn validate_display_name(display_name: &str) -> Result<()> {
    if display_name.trim().is_empty() {
        return Err(StashError::bad_request("file name cannot be empty"));
    }
    if display_name.chars().any(char::is_control) {
        return Err(StashError::bad_request("file name contains control characters"));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use object_store::BlobStore;

    use super::*;
    use crate::credentials::CredentialStore;
    use crate::store::MemoryStorageProvider;
    use crate::tree::ResourceTree;

    /// In-memory blobs whose deletes can be made to fail
    #[derive(Debug, Clone)]
    pub(crate) struct FlakyBlobs {
        inner: BlobStore,
        fail_deletes: Arc<AtomicBool>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("injected blob failure")]
    pub(crate) struct InjectedFailure;

    impl FlakyBlobs {
        pub(crate) fn new() -> Self {
            Self {
                inner: BlobStore::in_memory(),
                fail_deletes: Arc::new(AtomicBool::new(false)),
            }
        }

        pub(crate) fn fail_deletes(&self, fail: bool) {
            self.fail_deletes.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl BlobStorage for FlakyBlobs {
        type Error = InjectedFailure;

        async fn put(&self, content_key: &str, data: Bytes) -> std::result::Result<(), Self::Error> {
            self.inner.put(content_key, data).await.map_err(|_| InjectedFailure)
        }

        async fn get(&self, content_key: &str) -> std::result::Result<Option<Bytes>, Self::Error> {
            self.inner.get(content_key).await.map_err(|_| InjectedFailure)
        }

        async fn delete(&self, content_key: &str) -> std::result::Result<(), Self::Error> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(InjectedFailure);
            }
            self.inner.delete(content_key).await.map_err(|_| InjectedFailure)
        }
    }

    struct Fixture {
        catalog: FileCatalog<MemoryStorageProvider, FlakyBlobs>,
        blobs: FlakyBlobs,
        alice: Uuid,
        alice_root: Uuid,
        bob_root: Uuid,
    }

    async fn setup() -> Fixture {
        let provider = MemoryStorageProvider::new();
        let credentials = CredentialStore::new(provider.clone());
        let tree = ResourceTree::new(provider.clone());
        let alice = credentials.create_user("alice", "pw1").await.unwrap();
        let bob = credentials.create_user("bob", "pw2").await.unwrap();
        let alice_root = tree.ensure_root_folder(alice.id).await.unwrap().id;
        let bob_root = tree.ensure_root_folder(bob.id).await.unwrap().id;

        let blobs = FlakyBlobs::new();
        Fixture {
            catalog: FileCatalog::new(provider, blobs.clone()),
            blobs,
            alice: alice.id,
            alice_root,
            bob_root,
        }
    }

    #[tokio::test]
    async fn test_save_metadata_requires_owned_folder() {
        let fx = setup().await;
        let record = fx
            .catalog
            .save_metadata(fx.alice, fx.alice_root, "report.pdf", "key123")
            .await
            .unwrap();
        assert_eq!(record.display_name, "report.pdf");

        let foreign = fx
            .catalog
            .save_metadata(fx.alice, fx.bob_root, "sneaky.txt", "key456")
            .await;
        assert_eq!(foreign.unwrap_err(), StashError::Forbidden);

        let missing = fx
            .catalog
            .save_metadata(fx.alice, Uuid::new_v4(), "lost.txt", "key789")
            .await;
        assert_eq!(missing.unwrap_err(), StashError::Forbidden);

        let duplicate = fx
            .catalog
            .save_metadata(fx.alice, fx.alice_root, "again.pdf", "key123")
            .await;
        assert!(matches!(duplicate, Err(StashError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_view_and_delete_are_owner_scoped() {
        let fx = setup().await;
        let record = fx
            .catalog
            .store(fx.alice, fx.alice_root, "notes.txt", Bytes::from("hi"))
            .await
            .unwrap();
        let key = record.content_key.as_str();

        assert_eq!(fx.catalog.view("bob", key).await.unwrap_err(), StashError::Forbidden);
        assert_eq!(fx.catalog.delete("bob", key).await.unwrap_err(), StashError::Forbidden);

        let (viewed, data) = fx.catalog.read("alice", key).await.unwrap();
        assert_eq!(viewed, record);
        assert_eq!(data, Bytes::from("hi"));

        assert!(fx.blobs.inner.has(key).await.unwrap());
        fx.catalog.delete("alice", key).await.unwrap();
        assert!(matches!(
            fx.catalog.view("alice", key).await,
            Err(StashError::NotFound(_))
        ));
        assert!(fx.blobs.inner.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_release_blobs_deletes_each_key() {
        let fx = setup().await;
        for name in ["a.txt", "b.txt"] {
            fx.catalog
                .store(fx.alice, fx.alice_root, name, Bytes::from("x"))
                .await
                .unwrap();
        }
        let keys = fx.blobs.inner.list().await.unwrap();
        assert_eq!(keys.len(), 2);

        fx.catalog.release_blobs(&keys).await;
        assert!(fx.blobs.inner.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_blob_delete_restores_record() {
        let fx = setup().await;
        let record = fx
            .catalog
            .store(fx.alice, fx.alice_root, "keep.txt", Bytes::from("data"))
            .await
            .unwrap();

        fx.blobs.fail_deletes(true);
        let result = fx.catalog.delete("alice", &record.content_key).await;
        assert_eq!(result.unwrap_err(), StashError::Internal);

        let resolved = fx.catalog.resolve(&record.content_key).await.unwrap();
        assert_eq!(resolved.record, record);

        fx.blobs.fail_deletes(false);
        fx.catalog.delete("alice", &record.content_key).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_store_releases_blob() {
        let fx = setup().await;
        let result = fx
            .catalog
            .store(fx.alice, fx.bob_root, "sneaky.txt", Bytes::from("x"))
            .await;
        assert_eq!(result.unwrap_err(), StashError::Forbidden);
        assert!(fx.blobs.inner.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_content_key() {
        let fx = setup().await;
        assert!(matches!(
            fx.catalog.resolve("nope").await,
            Err(StashError::NotFound(_))
        ));
    }
}
