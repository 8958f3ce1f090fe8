use std::fmt::Debug;

use async_trait::async_trait;
use uuid::Uuid;

use crate::account::{Account, Role};
use crate::catalog::{FileRecord, NewFileRecord, ResolvedFile};
use crate::tree::Folder;

/// Outcome of the conditional administrator credential update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialReplacement {
    Replaced,
    /// The administrator has already left its default-credential state
    AlreadyCustomized,
    /// No administrator has been bootstrapped
    Missing,
}

/// Outcome of the ownership-checked file record insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileInsert {
    Inserted(FileRecord),
    /// The folder does not exist or is owned by another account
    FolderNotOwned,
    DuplicateContentKey,
}

// NOTE: operations that need to be atomic against concurrent callers
//  (root creation, credential replacement, ownership-checked inserts,
//  cascading deletes) are expressed as single provider calls so
//  implementations can run them in one statement or transaction.
#[async_trait]
pub trait StorageProvider: Send + Sync + Debug + Clone + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert the administrator if none exists yet.
    ///
    /// # Returns
    /// * `Ok(true)` - `account` was inserted
    /// * `Ok(false)` - an administrator already existed and was left untouched
    async fn ensure_administrator(&self, account: &Account) -> Result<bool, Self::Error>;

    async fn account_by_login(
        &self,
        role: Role,
        login_name: &str,
    ) -> Result<Option<Account>, Self::Error>;

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, Self::Error>;

    /// Set the administrator's login and credential hash and clear its
    ///  default-credential flag, only if the flag is currently set.
    async fn replace_default_credential(
        &self,
        login_name: &str,
        credential_hash: &str,
    ) -> Result<CredentialReplacement, Self::Error>;

    /// Insert a user account.
    ///
    /// # Returns
    /// * `Ok(false)` - a user with the same login name already exists
    async fn insert_user(&self, account: &Account) -> Result<bool, Self::Error>;

    /// Delete a user together with its folders and file records.
    ///
    /// # Returns
    /// * `Ok(Some(keys))` - the content keys of the removed file records
    /// * `Ok(None)` - no such user
    async fn delete_user(&self, login_name: &str) -> Result<Option<Vec<String>>, Self::Error>;

    /// Login names of all user accounts, sorted
    async fn list_users(&self) -> Result<Vec<String>, Self::Error>;

    /// Insert `candidate` as the owner's root unless a root already exists,
    ///  returning whichever root is stored afterwards.
    async fn ensure_root_folder(&self, candidate: &Folder) -> Result<Folder, Self::Error>;

    async fn folder(&self, id: Uuid) -> Result<Option<Folder>, Self::Error>;

    async fn insert_folder(&self, folder: &Folder) -> Result<(), Self::Error>;

    async fn child_folders(&self, parent_id: Uuid) -> Result<Vec<Folder>, Self::Error>;

    /// Insert a file record only if its folder is owned by `owner_account_id`.
    async fn insert_file(
        &self,
        owner_account_id: Uuid,
        file: &NewFileRecord,
    ) -> Result<FileInsert, Self::Error>;

    async fn resolve_file(&self, content_key: &str) -> Result<Option<ResolvedFile>, Self::Error>;

    async fn files_in_folder(&self, folder_id: Uuid) -> Result<Vec<FileRecord>, Self::Error>;

    /// Remove a file record, returning it if it existed.
    async fn delete_file(&self, content_key: &str) -> Result<Option<FileRecord>, Self::Error>;

    /// Re-insert a previously deleted record with its original id.
    async fn restore_file(&self, record: &FileRecord) -> Result<(), Self::Error>;

    /// Cheap round trip used by readiness checks
    async fn ping(&self) -> Result<(), Self::Error>;
}
