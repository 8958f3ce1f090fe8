//! Account credentials and the administrator bootstrap.
//!
//! The administrator moves through exactly two states:
//! `DefaultCredential -> Customized`. The transition fires once, through
//! [`CredentialStore::replace_default_credential`], and `Customized` is
//! absorbing.

use crate::account::{Account, Role, DEFAULT_ADMIN_CREDENTIAL, DEFAULT_ADMIN_LOGIN};
use crate::crypto::{hash_password, verify_password};
use crate::error::{Result, StashError};
use crate::store::{CredentialReplacement, StorageProvider};

const MAX_LOGIN_NAME_LEN: usize = 128;

/// Result of checking a plaintext credential against an account.
///
/// Callers must collapse "no such account" and "wrong credential" into the
/// same response.
#[derive(Debug, Clone)]
pub struct CredentialCheck {
    pub account: Option<Account>,
    pub credential_matches: bool,
}

impl CredentialCheck {
    pub fn account_exists(&self) -> bool {
        self.account.is_some()
    }

    pub fn uses_default_credential(&self) -> bool {
        self.account
            .as_ref()
            .is_some_and(|a| a.uses_default_credential)
    }

    /// The account, if it exists and the credential matched
    pub fn into_verified(self) -> Option<Account> {
        match self.credential_matches {
            true => self.account,
            false => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialStore<P> {
    provider: P,
}

impl<P: StorageProvider> CredentialStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Create the administrator with the factory credential unless one
    /// already exists. Safe to call on every start.
    pub async fn bootstrap_administrator(&self, default_flag: bool) -> Result<()> {
        let hash = hash_off_thread(DEFAULT_ADMIN_CREDENTIAL.to_string()).await?;
        let mut admin = Account::new(DEFAULT_ADMIN_LOGIN, hash, Role::Administrator);
        admin.uses_default_credential = default_flag;

        let created = self
            .provider
            .ensure_administrator(&admin)
            .await
            .map_err(|e| StashError::internal("failed to bootstrap administrator", e))?;

        if created {
            tracing::info!(
                login = DEFAULT_ADMIN_LOGIN,
                uses_default_credential = default_flag,
                "bootstrapped administrator account"
            );
        } else {
            tracing::debug!("administrator already present, skipping bootstrap");
        }
        Ok(())
    }

    pub async fn verify_credential(
        &self,
        role: Role,
        login_name: &str,
        plaintext: &str,
    ) -> Result<CredentialCheck> {
        let account = self
            .provider
            .account_by_login(role, login_name)
            .await
            .map_err(|e| StashError::internal("failed to look up account", e))?;

        let Some(account) = account else {
            // burn comparable work so a missing account is not distinguishable by latency
            if let Err(e) = hash_off_thread(plaintext.to_string()).await {
                tracing::debug!(error = %e, "hashing for unknown account failed");
            }
            return Ok(CredentialCheck {
                account: None,
                credential_matches: false,
            });
        };

        let credential_matches =
            verify_off_thread(plaintext.to_string(), account.credential_hash.clone()).await?;
        Ok(CredentialCheck {
            account: Some(account),
            credential_matches,
        })
    }

    pub async fn replace_default_credential(
        &self,
        new_login_name: &str,
        new_plaintext: &str,
    ) -> Result<()> {
        validate_login_name(new_login_name)?;
        validate_credential(new_plaintext)?;

        let hash = hash_off_thread(new_plaintext.to_string()).await?;
        let outcome = self
            .provider
            .replace_default_credential(new_login_name, &hash)
            .await
            .map_err(|e| StashError::internal("failed to replace administrator credential", e))?;

        match outcome {
            CredentialReplacement::Replaced => {
                tracing::info!(login = new_login_name, "administrator credential customized");
                Ok(())
            }
            CredentialReplacement::AlreadyCustomized => Err(StashError::conflict(
                "administrator credential has already been changed",
            )),
            CredentialReplacement::Missing => Err(StashError::not_found("administrator")),
        }
    }

    pub async fn create_user(&self, login_name: &str, plaintext: &str) -> Result<Account> {
        validate_login_name(login_name)?;
        validate_credential(plaintext)?;

        let hash = hash_off_thread(plaintext.to_string()).await?;
        let account = Account::new(login_name, hash, Role::User);

        let inserted = self
            .provider
            .insert_user(&account)
            .await
            .map_err(|e| StashError::internal("failed to create user", e))?;
        if !inserted {
            return Err(StashError::conflict(format!(
                "user {} already exists",
                login_name
            )));
        }

        tracing::info!(login = login_name, account_id = %account.id, "created user");
        Ok(account)
    }

    /// Remove a user and everything it owns, returning the content keys of
    /// the file records that went with it.
    pub async fn delete_user(&self, login_name: &str) -> Result<Vec<String>> {
        let released = self
            .provider
            .delete_user(login_name)
            .await
            .map_err(|e| StashError::internal("failed to delete user", e))?
            .ok_or_else(|| StashError::not_found(format!("user {}", login_name)))?;

        tracing::info!(
            login = login_name,
            released_files = released.len(),
            "deleted user"
        );
        Ok(released)
    }

    pub async fn list_users(&self) -> Result<Vec<String>> {
        self.provider
            .list_users()
            .await
            .map_err(|e| StashError::internal("failed to list users", e))
    }
}

fn validate_login_name(login_name: &str) -> Result<()> {
    if login_name.trim().is_empty() {
        return Err(StashError::bad_request("login name cannot be empty"));
    }
    if login_name.len() > MAX_LOGIN_NAME_LEN || login_name.chars().any(char::is_control) {
        return Err(StashError::bad_request("login name is not valid"));
    }
    Ok(())
}

fn validate_credential(plaintext: &str) -> Result<()> {
    if plaintext.is_empty() {
        return Err(StashError::bad_request("password cannot be empty"));
    }
    Ok(())
}

// argon2 is deliberately expensive; keep it off the async workers
async fn hash_off_thread(plaintext: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .map_err(|e| StashError::internal("credential hashing task failed", e))?
        .map_err(|e| StashError::internal("failed to hash credential", e))
}

async fn verify_off_thread(plaintext: String, stored_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plaintext, &stored_hash))
        .await
        .map_err(|e| StashError::internal("credential verification task failed", e))?
        .map_err(|e| StashError::internal("failed to verify credential", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorageProvider;

    fn store() -> CredentialStore<MemoryStorageProvider> {
        CredentialStore::new(MemoryStorageProvider::new())
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let store = store();
        store.bootstrap_administrator(true).await.unwrap();
        store
            .replace_default_credential("root", "S3cret!")
            .await
            .unwrap();

        // a restart must not resurrect the factory credential
        store.bootstrap_administrator(true).await.unwrap();

        let check = store
            .verify_credential(Role::Administrator, "admin", "admin")
            .await
            .unwrap();
        assert!(!check.account_exists());

        let check = store
            .verify_credential(Role::Administrator, "root", "S3cret!")
            .await
            .unwrap();
        assert!(check.credential_matches);
        assert!(!check.uses_default_credential());
    }

    #[tokio::test]
    async fn test_bootstrap_respects_default_flag() {
        let store = store();
        store.bootstrap_administrator(false).await.unwrap();

        let check = store
            .verify_credential(Role::Administrator, "admin", "admin")
            .await
            .unwrap();
        assert!(check.credential_matches);
        assert!(!check.uses_default_credential());

        // nothing to customize when the default flag was never set
        let result = store.replace_default_credential("root", "pw").await;
        assert!(matches!(result, Err(StashError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_replace_default_credential_once() {
        let store = store();
        store.bootstrap_administrator(true).await.unwrap();

        store.replace_default_credential("root", "first").await.unwrap();
        let second = store.replace_default_credential("other", "second").await;
        assert!(matches!(second, Err(StashError::Conflict(_))));

        let check = store
            .verify_credential(Role::Administrator, "root", "first")
            .await
            .unwrap();
        assert!(check.credential_matches);
    }

    #[tokio::test]
    async fn test_replace_without_administrator() {
        let result = store().replace_default_credential("root", "pw").await;
        assert!(matches!(result, Err(StashError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_wrong_credential_and_missing_account() {
        let store = store();
        store.create_user("alice", "pw1").await.unwrap();

        let wrong = store
            .verify_credential(Role::User, "alice", "nope")
            .await
            .unwrap();
        assert!(wrong.account_exists());
        assert!(!wrong.credential_matches);
        assert!(wrong.into_verified().is_none());

        let missing = store
            .verify_credential(Role::User, "bob", "pw1")
            .await
            .unwrap();
        assert!(!missing.account_exists());
        assert!(!missing.credential_matches);
    }

    #[tokio::test]
    async fn test_namespaces_are_disjoint() {
        let store = store();
        store.bootstrap_administrator(false).await.unwrap();
        store.create_user("admin", "user-pw").await.unwrap();

        let as_user = store
            .verify_credential(Role::User, "admin", "admin")
            .await
            .unwrap();
        assert!(!as_user.credential_matches);

        let as_admin = store
            .verify_credential(Role::Administrator, "admin", "user-pw")
            .await
            .unwrap();
        assert!(!as_admin.credential_matches);
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let store = store();
        let alice = store.create_user("alice", "pw1").await.unwrap();
        store.create_user("bob", "pw2").await.unwrap();
        assert_ne!(alice.id, uuid::Uuid::nil());

        let duplicate = store.create_user("alice", "other").await;
        assert!(matches!(duplicate, Err(StashError::Conflict(_))));

        assert_eq!(store.list_users().await.unwrap(), vec!["alice", "bob"]);

        store.delete_user("alice").await.unwrap();
        assert_eq!(store.list_users().await.unwrap(), vec!["bob"]);

        let again = store.delete_user("alice").await;
        assert!(matches!(again, Err(StashError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_user_rejects_empty_input() {
        let store = store();
        assert!(matches!(
            store.create_user("", "pw").await,
            Err(StashError::BadRequest(_))
        ));
        assert!(matches!(
            store.create_user("alice", "").await,
            Err(StashError::BadRequest(_))
        ));
    }
}
