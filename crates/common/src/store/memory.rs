use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::provider::{CredentialReplacement, FileInsert, StorageProvider};
use crate::account::{Account, Role};
use crate::catalog::{FileRecord, NewFileRecord, ResolvedFile};
use crate::tree::Folder;

/// In-memory storage provider using HashMaps
#[derive(Debug, Clone)]
pub struct MemoryStorageProvider {
    inner: Arc<RwLock<MemoryStorageProviderInner>>,
}

#[derive(Debug, Default)]
struct MemoryStorageProviderInner {
    accounts: HashMap<Uuid, Account>,
    folders: HashMap<Uuid, Folder>,
    /// file records keyed by their sequence id
    files: BTreeMap<i64, FileRecord>,
    last_file_id: i64,
}

impl MemoryStorageProviderInner {
    fn find_account(&self, role: Role, login_name: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.role == role && a.login_name == login_name)
    }

    fn administrator_mut(&mut self) -> Option<&mut Account> {
        self.accounts
            .values_mut()
            .find(|a| a.role == Role::Administrator)
    }

    fn find_file(&self, content_key: &str) -> Option<&FileRecord> {
        self.files.values().find(|f| f.content_key == content_key)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryStorageProviderError {
    #[error("memory provider error: {0}")]
    Internal(String),
}

impl MemoryStorageProvider {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryStorageProviderInner::default())),
        }
    }

    fn read(
        &self,
    ) -> Result<RwLockReadGuard<'_, MemoryStorageProviderInner>, MemoryStorageProviderError> {
        self.inner.read().map_err(|e| {
            MemoryStorageProviderError::Internal(format!("failed to acquire read lock: {}", e))
        })
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, MemoryStorageProviderInner>, MemoryStorageProviderError> {
        self.inner.write().map_err(|e| {
            MemoryStorageProviderError::Internal(format!("failed to acquire write lock: {}", e))
        })
    }
}

impl Default for MemoryStorageProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    type Error = MemoryStorageProviderError;

    async fn ensure_administrator(&self, account: &Account) -> Result<bool, Self::Error> {
        let mut inner = self.write()?;
        if inner.administrator_mut().is_some() {
            return Ok(false);
        }
        inner.accounts.insert(account.id, account.clone());
        Ok(true)
    }

    async fn account_by_login(
        &self,
        role: Role,
        login_name: &str,
    ) -> Result<Option<Account>, Self::Error> {
        Ok(self.read()?.find_account(role, login_name).cloned())
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>, Self::Error> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    async fn replace_default_credential(
        &self,
        login_name: &str,
        credential_hash: &str,
    ) -> Result<CredentialReplacement, Self::Error> {
        let mut inner = self.write()?;
        let Some(admin) = inner.administrator_mut() else {
            return Ok(CredentialReplacement::Missing);
        };
        if !admin.uses_default_credential {
            return Ok(CredentialReplacement::AlreadyCustomized);
        }

        admin.login_name = login_name.to_string();
        admin.credential_hash = credential_hash.to_string();
        admin.uses_default_credential = false;
        Ok(CredentialReplacement::Replaced)
    }

    async fn insert_user(&self, account: &Account) -> Result<bool, Self::Error> {
        let mut inner = self.write()?;
        if inner.find_account(Role::User, &account.login_name).is_some() {
            return Ok(false);
        }
        inner.accounts.insert(account.id, account.clone());
        Ok(true)
    }

    async fn delete_user(&self, login_name: &str) -> Result<Option<Vec<String>>, Self::Error> {
        let mut inner = self.write()?;
        let Some(account_id) = inner.find_account(Role::User, login_name).map(|a| a.id) else {
            return Ok(None);
        };

        inner.accounts.remove(&account_id);
        let owned: Vec<Uuid> = inner
            .folders
            .values()
            .filter(|f| f.owner_account_id == account_id)
            .map(|f| f.id)
            .collect();
        for folder_id in &owned {
            inner.folders.remove(folder_id);
        }

        let mut released = Vec::new();
        inner.files.retain(|_, file| {
            if owned.contains(&file.folder_id) {
                released.push(file.content_key.clone());
                false
            } else {
                true
            }
        });

        Ok(Some(released))
    }

    async fn list_users(&self) -> Result<Vec<String>, Self::Error> {
        let inner = self.read()?;
        let mut users: Vec<String> = inner
            .accounts
            .values()
            .filter(|a| a.role == Role::User)
            .map(|a| a.login_name.clone())
            .collect();
        users.sort();
        Ok(users)
    }

    async fn ensure_root_folder(&self, candidate: &Folder) -> Result<Folder, Self::Error> {
        let mut inner = self.write()?;
        let existing = inner
            .folders
            .values()
            .find(|f| f.owner_account_id == candidate.owner_account_id && f.parent_id.is_none())
            .cloned();

        match existing {
            Some(root) => Ok(root),
            None => {
                inner.folders.insert(candidate.id, candidate.clone());
                Ok(candidate.clone())
            }
        }
    }

    async fn folder(&self, id: Uuid) -> Result<Option<Folder>, Self::Error> {
        Ok(self.read()?.folders.get(&id).cloned())
    }

    async fn insert_folder(&self, folder: &Folder) -> Result<(), Self::Error> {
        self.write()?.folders.insert(folder.id, folder.clone());
        Ok(())
    }

    async fn child_folders(&self, parent_id: Uuid) -> Result<Vec<Folder>, Self::Error> {
        let inner = self.read()?;
        let mut children: Vec<Folder> = inner
            .folders
            .values()
            .filter(|f| f.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn insert_file(
        &self,
        owner_account_id: Uuid,
        file: &NewFileRecord,
    ) -> Result<FileInsert, Self::Error> {
        let mut inner = self.write()?;
        let owned = inner
            .folders
            .get(&file.folder_id)
            .is_some_and(|f| f.owner_account_id == owner_account_id);
        if !owned {
            return Ok(FileInsert::FolderNotOwned);
        }
        if inner.find_file(&file.content_key).is_some() {
            return Ok(FileInsert::DuplicateContentKey);
        }

        inner.last_file_id += 1;
        let record = FileRecord {
            id: inner.last_file_id,
            folder_id: file.folder_id,
            display_name: file.display_name.clone(),
            content_key: file.content_key.clone(),
        };
        inner.files.insert(record.id, record.clone());
        Ok(FileInsert::Inserted(record))
    }

    async fn resolve_file(&self, content_key: &str) -> Result<Option<ResolvedFile>, Self::Error> {
        let inner = self.read()?;
        let Some(record) = inner.find_file(content_key) else {
            return Ok(None);
        };

        let owner = inner
            .folders
            .get(&record.folder_id)
            .and_then(|folder| inner.accounts.get(&folder.owner_account_id));

        Ok(owner.map(|owner| ResolvedFile {
            record: record.clone(),
            owner_account_id: owner.id,
            owner_login_name: owner.login_name.clone(),
        }))
    }

    async fn files_in_folder(&self, folder_id: Uuid) -> Result<Vec<FileRecord>, Self::Error> {
        Ok(self
            .read()?
            .files
            .values()
            .filter(|f| f.folder_id == folder_id)
            .cloned()
            .collect())
    }

    async fn delete_file(&self, content_key: &str) -> Result<Option<FileRecord>, Self::Error> {
        let mut inner = self.write()?;
        let Some(id) = inner.find_file(content_key).map(|f| f.id) else {
            return Ok(None);
        };
        Ok(inner.files.remove(&id))
    }

    async fn restore_file(&self, record: &FileRecord) -> Result<(), Self::Error> {
        self.write()?.files.insert(record.id, record.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        self.read().map(|_| ())
    }
}
