use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::{Account, Role};
use crate::blobs::BlobStorage;
use crate::catalog::{FileCatalog, FileRecord};
use crate::credentials::CredentialStore;
use crate::crypto::TokenService;
use crate::error::{Result, StashError};
use crate::gate::AuthorizationGate;
use crate::store::StorageProvider;
use crate::tree::{Folder, FolderListing, ResourceTree};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminLogin {
    /// The factory credential is still in place and must be replaced
    /// before any token is issued
    pub requires_credential_reset: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLogin {
    pub token: String,
    pub account_id: Uuid,
    pub root_folder_id: Uuid,
}

/// The operations stash exposes, composed over one storage provider, one
/// blob store and one token service.
#[derive(Debug, Clone)]
pub struct Stash<P, B> {
    credentials: CredentialStore<P>,
    tokens: Arc<TokenService>,
    gate: AuthorizationGate<P>,
    tree: ResourceTree<P>,
    catalog: FileCatalog<P, B>,
}

impl<P: StorageProvider, B: BlobStorage> Stash<P, B> {
    pub fn new(provider: P, blobs: B, tokens: TokenService) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            credentials: CredentialStore::new(provider.clone()),
            gate: AuthorizationGate::new(provider.clone(), tokens.clone()),
            tree: ResourceTree::new(provider.clone()),
            catalog: FileCatalog::new(provider, blobs),
            tokens,
        }
    }

    pub fn credentials(&self) -> &CredentialStore<P> {
        &self.credentials
    }

    pub fn gate(&self) -> &AuthorizationGate<P> {
        &self.gate
    }

    pub fn tree(&self) -> &ResourceTree<P> {
        &self.tree
    }

    pub fn catalog(&self) -> &FileCatalog<P, B> {
        &self.catalog
    }

    pub async fn bootstrap(&self, default_flag: bool) -> Result<()> {
        self.credentials.bootstrap_administrator(default_flag).await
    }

    pub async fn administrator_login(&self, login_name: &str, password: &str) -> Result<AdminLogin> {
        let check = self
            .credentials
            .verify_credential(Role::Administrator, login_name, password)
            .await?;
        let admin = check.into_verified().ok_or(StashError::Unauthorized)?;

        if admin.uses_default_credential {
            tracing::info!("administrator logged in with factory credential, reset required");
            return Ok(AdminLogin {
                requires_credential_reset: true,
                token: None,
            });
        }

        let token = self.issue(&admin)?;
        Ok(AdminLogin {
            requires_credential_reset: false,
            token: Some(token),
        })
    }

    pub async fn set_initial_admin_credential(&self, login_name: &str, password: &str) -> Result<()> {
        self.credentials
            .replace_default_credential(login_name, password)
            .await
    }

    pub async fn create_user(&self, login_name: &str, password: &str) -> Result<Account> {
        self.credentials.create_user(login_name, password).await
    }

    /// Delete a user with everything it owns, then release the bytes of its
    /// files.
    pub async fn delete_user(&self, login_name: &str) -> Result<()> {
        let released = self.credentials.delete_user(login_name).await?;
        self.catalog.release_blobs(&released).await;
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<String>> {
        self.credentials.list_users().await
    }

    pub async fn user_login(&self, login_name: &str, password: &str) -> Result<UserLogin> {
        let check = self
            .credentials
            .verify_credential(Role::User, login_name, password)
            .await?;
        let account = check.into_verified().ok_or(StashError::Unauthorized)?;

        let root = self.tree.ensure_root_folder(account.id).await?;
        let token = self.issue(&account)?;
        Ok(UserLogin {
            token,
            account_id: account.id,
            root_folder_id: root.id,
        })
    }

    pub async fn create_folder(
        &self,
        owner_account_id: Uuid,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Folder> {
        self.tree
            .create_folder(owner_account_id, name, parent_id)
            .await
    }

    pub async fn list_folder(&self, owner_account_id: Uuid, folder_id: Uuid) -> Result<FolderListing> {
        self.tree.list_folder(owner_account_id, folder_id).await
    }

    pub async fn upload_file_metadata(
        &self,
        owner_account_id: Uuid,
        folder_id: Uuid,
        display_name: &str,
        content_key: &str,
    ) -> Result<FileRecord> {
        self.catalog
            .save_metadata(owner_account_id, folder_id, display_name, content_key)
            .await
    }

    pub async fn store_file(
        &self,
        owner_account_id: Uuid,
        folder_id: Uuid,
        display_name: &str,
        data: Bytes,
    ) -> Result<FileRecord> {
        self.catalog
            .store(owner_account_id, folder_id, display_name, data)
            .await
    }

    pub async fn view_file(&self, requester_login: &str, content_key: &str) -> Result<FileRecord> {
        self.catalog.view(requester_login, content_key).await
    }

    pub async fn read_file(&self, requester_login: &str, content_key: &str) -> Result<(FileRecord, Bytes)> {
        self.catalog.read(requester_login, content_key).await
    }

    pub async fn delete_file(&self, requester_login: &str, content_key: &str) -> Result<()> {
        self.catalog.delete(requester_login, content_key).await
    }

    pub async fn is_administrator(&self, login_name: &str, token: &str) -> bool {
        self.gate.is_administrator(login_name, token).await
    }

    pub async fn is_user(&self, login_name: &str, token: &str) -> bool {
        self.gate.is_user(login_name, token).await
    }

    fn issue(&self, account: &Account) -> Result<String> {
        self.tokens
            .issue(&account.login_name, account.role)
            .map_err(|e| StashError::internal("failed to issue token", e))
    }
}
