use std::sync::Arc;

use crate::account::{Account, Role};
use crate::crypto::TokenService;
use crate::error::{Result, StashError};
use crate::store::StorageProvider;

/// Decides whether a caller presenting `(claimed login, token)` may act as
/// that identity.
///
/// A token only admits the exact subject and role it was issued for, and the
/// subject must still resolve to an account of that role. Deleted accounts
/// therefore lose access immediately even though tokens cannot be revoked.
#[derive(Debug, Clone)]
pub struct AuthorizationGate<P> {
    provider: P,
    tokens: Arc<TokenService>,
}

impl<P: StorageProvider> AuthorizationGate<P> {
    pub fn new(provider: P, tokens: Arc<TokenService>) -> Self {
        Self { provider, tokens }
    }

    pub async fn authenticate_as_user(&self, claimed_login: &str, token: &str) -> Result<Account> {
        self.authenticate(Role::User, claimed_login, token).await
    }

    pub async fn authenticate_as_administrator(
        &self,
        claimed_login: &str,
        token: &str,
    ) -> Result<Account> {
        self.authenticate(Role::Administrator, claimed_login, token)
            .await
    }

    pub async fn is_user(&self, claimed_login: &str, token: &str) -> bool {
        self.authenticate_as_user(claimed_login, token).await.is_ok()
    }

    pub async fn is_administrator(&self, claimed_login: &str, token: &str) -> bool {
        self.authenticate_as_administrator(claimed_login, token)
            .await
            .is_ok()
    }

    async fn authenticate(&self, role: Role, claimed_login: &str, token: &str) -> Result<Account> {
        let claims = self.tokens.validate(token).map_err(|e| {
            tracing::debug!(reason = %e, "rejecting capability token");
            StashError::Unauthorized
        })?;

        if claims.sub != claimed_login || claims.role != role {
            tracing::debug!(
                claimed = claimed_login,
                subject = %claims.sub,
                "token does not bind the claimed identity"
            );
            return Err(StashError::Unauthorized);
        }

        self.provider
            .account_by_login(role, claimed_login)
            .await
            .map_err(|e| StashError::internal("failed to resolve token subject", e))?
            .ok_or(StashError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::credentials::CredentialStore;
    use crate::crypto::{SigningKey, SIGNING_KEY_SIZE};
    use crate::store::MemoryStorageProvider;

    async fn setup() -> (AuthorizationGate<MemoryStorageProvider>, Arc<TokenService>) {
        let provider = MemoryStorageProvider::new();
        let credentials = CredentialStore::new(provider.clone());
        credentials.bootstrap_administrator(false).await.unwrap();
        credentials.create_user("alice", "pw1").await.unwrap();
        credentials.create_user("bob", "pw2").await.unwrap();

        let tokens = Arc::new(TokenService::new(
            SigningKey::from([1u8; SIGNING_KEY_SIZE]),
            Duration::from_secs(60),
        ));
        (AuthorizationGate::new(provider, tokens.clone()), tokens)
    }

    #[tokio::test]
    async fn test_token_binds_its_subject() {
        let (gate, tokens) = setup().await;
        let token = tokens.issue("alice", Role::User).unwrap();

        let account = gate.authenticate_as_user("alice", &token).await.unwrap();
        assert_eq!(account.login_name, "alice");

        let borrowed = gate.authenticate_as_user("bob", &token).await;
        assert_eq!(borrowed.unwrap_err(), StashError::Unauthorized);
    }

    #[tokio::test]
    async fn test_roles_do_not_cross() {
        let (gate, tokens) = setup().await;
        let user_token = tokens.issue("admin", Role::User).unwrap();
        let admin_token = tokens.issue("admin", Role::Administrator).unwrap();

        assert!(gate.is_administrator("admin", &admin_token).await);
        assert!(!gate.is_administrator("admin", &user_token).await);
        // no user named admin exists
        assert!(!gate.is_user("admin", &user_token).await);
        assert!(!gate.is_user("admin", &admin_token).await);
    }

    #[tokio::test]
    async fn test_deleted_account_loses_access() {
        let (gate, tokens) = setup().await;
        let token = tokens.issue("bob", Role::User).unwrap();
        assert!(gate.is_user("bob", &token).await);

        CredentialStore::new(gate.provider.clone())
            .delete_user("bob")
            .await
            .unwrap();
        assert!(!gate.is_user("bob", &token).await);
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let (gate, _) = setup().await;
        let result = gate.authenticate_as_user("alice", "garbage").await;
        assert_eq!(result.unwrap_err(), StashError::Unauthorized);
    }
}
