use std::path::PathBuf;
use std::time::Duration;

use common::prelude::SigningKey;
use object_store::ObjectStoreConfig;

#[derive(Debug)]
pub struct Config {
    // http server configuration
    /// Port for the API HTTP server
    pub api_port: u16,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,
    /// Blob storage backend configuration
    pub blob_store: ObjectStoreConfig,

    // credentials
    /// key used to sign capability tokens,
    ///  if not set then a new key will be generated
    pub signing_key: Option<SigningKey>,
    pub token_lifetime: Duration,
    /// bootstrap the administrator with the factory credential flagged
    ///  for replacement
    pub default_admin_credential: bool,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_port: 8080,
            sqlite_path: None,
            blob_store: ObjectStoreConfig::Memory,
            signing_key: None,
            token_lifetime: Duration::from_secs(100 * 60 * 60),
            default_admin_credential: true,
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}
