use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use common::prelude::SigningKey;
use object_store::ObjectStoreConfig;

pub const APP_NAME: &str = "stash";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const KEY_FILE_NAME: &str = "signing_key.pem";
pub const BLOBS_DIR_NAME: &str = "blobs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// How long issued capability tokens stay valid, in seconds
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
    /// Whether a freshly bootstrapped administrator must replace the
    ///  factory credential before it receives a token
    #[serde(default = "default_admin_credential")]
    pub default_admin_credential: bool,
    /// Where file contents live. A `local` store without an explicit
    ///  path is placed under the state directory at init.
    #[serde(default)]
    pub blob_store: ObjectStoreConfig,
}

fn default_api_port() -> u16 {
    8080
}

fn default_token_lifetime_secs() -> u64 {
    100 * 60 * 60
}

fn default_admin_credential() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            token_lifetime_secs: default_token_lifetime_secs(),
            default_admin_credential: default_admin_credential(),
            blob_store: ObjectStoreConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the stash directory (~/.stash)
    pub stash_dir: PathBuf,
    pub db_path: PathBuf,
    pub key_path: PathBuf,
    pub blobs_path: PathBuf,
    pub config_path: PathBuf,
    pub config: AppConfig,
}

impl AppState {
    /// Get the stash directory path (custom or default ~/.stash)
    pub fn stash_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new stash state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let stash_dir = Self::stash_dir(custom_path)?;

        if stash_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&stash_dir)?;

        let blobs_path = stash_dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;

        let key = SigningKey::generate().map_err(|e| StateError::InvalidKey(e.to_string()))?;
        let key_path = stash_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let mut config = config.unwrap_or_default();
        if let ObjectStoreConfig::Local { path } = &mut config.blob_store {
            if path.as_os_str().is_empty() {
                *path = blobs_path.clone();
            }
        }
        let config_path = stash_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        // the service runs migrations against this on first start
        let db_path = stash_dir.join(DB_FILE_NAME);
        fs::write(&db_path, "")?;

        Ok(Self {
            stash_dir,
            db_path,
            key_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the stash directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let stash_dir = Self::stash_dir(custom_path)?;

        if !stash_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = stash_dir.join(DB_FILE_NAME);
        let key_path = stash_dir.join(KEY_FILE_NAME);
        let blobs_path = stash_dir.join(BLOBS_DIR_NAME);
        let config_path = stash_dir.join(CONFIG_FILE_NAME);

        if !db_path.exists() {
            return Err(StateError::MissingFile(DB_FILE_NAME.to_string()));
        }
        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !blobs_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", BLOBS_DIR_NAME)));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            stash_dir,
            db_path,
            key_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load the token signing key from the key file
    pub fn load_key(&self) -> Result<SigningKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SigningKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("stash directory not initialized. Run 'stash init' first")]
    NotInitialized,

    #[error("stash directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("stash");

        let created = AppState::init(Some(dir.clone()), None).unwrap();
        assert!(created.blobs_path.is_dir());
        assert!(created.db_path.is_file());

        let loaded = AppState::load(Some(dir.clone())).unwrap();
        assert_eq!(loaded.config, AppConfig::default());
        assert_eq!(loaded.config.token_lifetime_secs, 360_000);

        let key = loaded.load_key().unwrap();
        assert_eq!(
            key.to_pem(),
            fs::read_to_string(&loaded.key_path).unwrap()
        );

        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_requires_every_file() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("stash");

        assert!(matches!(
            AppState::load(Some(dir.clone())),
            Err(StateError::NotInitialized)
        ));

        AppState::init(Some(dir.clone()), None).unwrap();
        fs::remove_file(dir.join(KEY_FILE_NAME)).unwrap();
        assert!(matches!(
            AppState::load(Some(dir)),
            Err(StateError::MissingFile(name)) if name == KEY_FILE_NAME
        ));
    }

    #[test]
    fn test_local_blob_store_defaults_under_state_dir() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("stash");
        let config = AppConfig {
            blob_store: ObjectStoreConfig::Local {
                path: PathBuf::new(),
            },
            ..AppConfig::default()
        };

        let state = AppState::init(Some(dir.clone()), Some(config)).unwrap();
        assert_eq!(
            state.config.blob_store,
            ObjectStoreConfig::Local {
                path: dir.join(BLOBS_DIR_NAME)
            }
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("api_port = 9000").unwrap();
        assert_eq!(config.api_port, 9000);
        assert!(config.default_admin_credential);
        assert_eq!(config.blob_store, ObjectStoreConfig::Memory);
    }
}
