use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::FileRecord;
use crate::error::{Result, StashError};
use crate::store::StorageProvider;

pub const ROOT_FOLDER_NAME: &str = "root";

/// A node in an account's folder hierarchy.
///
/// Each account has exactly one folder with no parent. Every other folder's
/// parent belongs to the same account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub owner_account_id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

impl Folder {
    fn root(owner_account_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_account_id,
            name: ROOT_FOLDER_NAME.to_string(),
            parent_id: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderListing {
    pub folder: Folder,
    /// root first, ending with `folder`
    pub path: Vec<Folder>,
    pub folders: Vec<Folder>,
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone)]
pub struct ResourceTree<P> {
    provider: P,
}

impl<P: StorageProvider> ResourceTree<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Return the owner's root, creating it if this is the first call.
    /// Concurrent callers all observe the same root.
    pub async fn ensure_root_folder(&self, owner_account_id: Uuid) -> Result<Folder> {
        let candidate = Folder::root(owner_account_id);
        let root = self
            .provider
            .ensure_root_folder(&candidate)
            .await
            .map_err(|e| StashError::internal("failed to ensure root folder", e))?;

        if root.id == candidate.id {
            tracing::info!(owner = %owner_account_id, folder_id = %root.id, "created root folder");
        }
        Ok(root)
    }

    /// Create a folder under `parent_id`, or under the owner's root when no
    /// parent is given.
    pub async fn create_folder(
        &self,
        owner_account_id: Uuid,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Folder> {
        if name.trim().is_empty() {
            return Err(StashError::bad_request("folder name cannot be empty"));
        }

        let owner = self
            .provider
            .account_by_id(owner_account_id)
            .await
            .map_err(|e| StashError::internal("failed to look up folder owner", e))?;
        if owner.is_none() {
            return Err(StashError::not_found(format!(
                "account {}",
                owner_account_id
            )));
        }

        let parent_id = match parent_id {
            Some(parent_id) => {
                let parent = self
                    .provider
                    .folder(parent_id)
                    .await
                    .map_err(|e| StashError::internal("failed to look up parent folder", e))?;
                match parent {
                    Some(parent) if parent.owner_account_id == owner_account_id => parent.id,
                    // foreign folders are reported exactly like missing ones
                    _ => {
                        return Err(StashError::bad_request(format!(
                            "parent folder {} does not exist",
                            parent_id
                        )))
                    }
                }
            }
            None => self.ensure_root_folder(owner_account_id).await?.id,
        };

        let folder = Folder {
            id: Uuid::new_v4(),
            owner_account_id,
            name: name.to_string(),
            parent_id: Some(parent_id),
        };
        self.provider
            .insert_folder(&folder)
            .await
            .map_err(|e| StashError::internal("failed to insert folder", e))?;

        tracing::debug!(owner = %owner_account_id, folder_id = %folder.id, "created folder");
        Ok(folder)
    }

    /// The chain of folders from the owner's root down to `folder_id`.
    pub async fn folder_path(&self, owner_account_id: Uuid, folder_id: Uuid) -> Result<Vec<Folder>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        let mut next = Some(folder_id);

        while let Some(id) = next {
            if !visited.insert(id) {
                tracing::error!(folder_id = %id, "cycle detected in folder hierarchy");
                return Err(StashError::Internal);
            }

            let folder = self
                .provider
                .folder(id)
                .await
                .map_err(|e| StashError::internal("failed to look up folder", e))?;

            match folder {
                Some(folder) if folder.owner_account_id == owner_account_id => {
                    next = folder.parent_id;
                    path.push(folder);
                }
                _ if path.is_empty() => {
                    return Err(StashError::not_found(format!("folder {}", folder_id)));
                }
                _ => {
                    tracing::error!(folder_id = %id, "folder hierarchy has a dangling or foreign parent");
                    return Err(StashError::Internal);
                }
            }
        }

        path.reverse();
        Ok(path)
    }

    pub async fn list_folder(
        &self,
        owner_account_id: Uuid,
        folder_id: Uuid,
    ) -> Result<FolderListing> {
        let path = self.folder_path(owner_account_id, folder_id).await?;
        let folder = path.last().cloned().ok_or(StashError::Internal)?;

        let folders = self
            .provider
            .child_folders(folder.id)
            .await
            .map_err(|e| StashError::internal("failed to list child folders", e))?;
        let files = self
            .provider
            .files_in_folder(folder.id)
            .await
            .map_err(|e| StashError::internal("failed to list folder files", e))?;

        Ok(FolderListing {
            folder,
            path,
            folders,
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::store::MemoryStorageProvider;

    async fn setup() -> (ResourceTree<MemoryStorageProvider>, Uuid, Uuid) {
        let provider = MemoryStorageProvider::new();
        let credentials = CredentialStore::new(provider.clone());
        let alice = credentials.create_user("alice", "pw1").await.unwrap();
        let bob = credentials.create_user("bob", "pw2").await.unwrap();
        (ResourceTree::new(provider), alice.id, bob.id)
    }

    #[tokio::test]
    async fn test_root_created_once() {
        let (tree, alice, _) = setup().await;
        let first = tree.ensure_root_folder(alice).await.unwrap();
        let second = tree.ensure_root_folder(alice).await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_root());
        assert_eq!(first.name, ROOT_FOLDER_NAME);
    }

    #[tokio::test]
    async fn test_concurrent_root_creation() {
        let (tree, alice, _) = setup().await;
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tree = tree.clone();
                tokio::spawn(async move { tree.ensure_root_folder(alice).await.unwrap() })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().id);
        }
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_create_folder_defaults_to_root() {
        let (tree, alice, _) = setup().await;
        let docs = tree.create_folder(alice, "docs", None).await.unwrap();
        let root = tree.ensure_root_folder(alice).await.unwrap();
        assert_eq!(docs.parent_id, Some(root.id));
    }

    #[tokio::test]
    async fn test_create_folder_rejects_bad_parents() {
        let (tree, alice, bob) = setup().await;

        let missing = tree.create_folder(alice, "x", Some(Uuid::new_v4())).await;
        assert!(matches!(missing, Err(StashError::BadRequest(_))));

        let bobs = tree.create_folder(bob, "private", None).await.unwrap();
        let foreign = tree.create_folder(alice, "x", Some(bobs.id)).await;
        assert!(matches!(foreign, Err(StashError::BadRequest(_))));

        let nobody = tree.create_folder(Uuid::new_v4(), "x", None).await;
        assert!(matches!(nobody, Err(StashError::NotFound(_))));

        let unnamed = tree.create_folder(alice, "  ", None).await;
        assert!(matches!(unnamed, Err(StashError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_folder_path_and_listing() {
        let (tree, alice, bob) = setup().await;
        let docs = tree.create_folder(alice, "docs", None).await.unwrap();
        let taxes = tree.create_folder(alice, "taxes", Some(docs.id)).await.unwrap();

        let path = tree.folder_path(alice, taxes.id).await.unwrap();
        let names: Vec<_> = path.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["root", "docs", "taxes"]);

        let listing = tree.list_folder(alice, docs.id).await.unwrap();
        assert_eq!(listing.folder, docs);
        assert_eq!(listing.folders, vec![taxes.clone()]);
        assert!(listing.files.is_empty());

        let snooping = tree.list_folder(bob, docs.id).await;
        assert!(matches!(snooping, Err(StashError::NotFound(_))));
    }
}
