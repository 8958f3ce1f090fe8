use url::Url;

use common::prelude::{SigningKey, Stash, TokenService};
use object_store::BlobStore;

use crate::database::{Database, DatabaseSetupError};
use crate::service_config::Config;

pub type ServiceStash = Stash<Database, BlobStore>;

/// Main service state, shared by every request handler
#[derive(Clone, Debug)]
pub struct State {
    database: Database,
    stash: ServiceStash,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                if !path.exists() {
                    return Err(StateSetupError::DatabasePathDoesNotExist);
                }
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup token signing
        let signing_key = match config.signing_key.clone() {
            Some(key) => key,
            None => {
                tracing::warn!("no signing key configured, tokens will not survive a restart");
                SigningKey::generate()
                    .map_err(|e| StateSetupError::SigningKeyError(e.to_string()))?
            }
        };
        let tokens = TokenService::new(signing_key, config.token_lifetime);

        // 3. Setup blobs store
        tracing::debug!(backend = ?config.blob_store, "ServiceState::from_config - loading blob store");
        let blobs = BlobStore::new(&config.blob_store)
            .await
            .map_err(|e| StateSetupError::BlobStoreError(e.to_string()))?;

        // 4. Compose and bootstrap the administrator
        let stash = Stash::new(database.clone(), blobs, tokens);
        stash
            .bootstrap(config.default_admin_credential)
            .await
            .map_err(|e| StateSetupError::BootstrapFailed(e.to_string()))?;

        Ok(Self { database, stash })
    }

    pub fn stash(&self) -> &ServiceStash {
        &self.stash
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        self.database()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
    #[error("Signing key error: {0}")]
    SigningKeyError(String),
    #[error("Blob store error: {0}")]
    BlobStoreError(String),
    #[error("Administrator bootstrap failed: {0}")]
    BootstrapFailed(String),
}
