use std::path::PathBuf;

use clap::{Args, ValueEnum};

use object_store::ObjectStoreConfig;
use stash_daemon::state::{AppConfig, AppState, StateError};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    /// Keep file contents in memory (lost on restart)
    Memory,
    /// Keep file contents on the local filesystem
    Local,
}

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port
    #[arg(long, default_value_t = 8080)]
    pub api_port: u16,

    /// Capability token lifetime in seconds
    #[arg(long, default_value_t = 360_000)]
    pub token_lifetime_secs: u64,

    /// Where to store file contents
    #[arg(long, value_enum, default_value_t = BlobBackend::Local)]
    pub blob_backend: BlobBackend,

    /// Directory for local blobs (defaults to <config dir>/blobs)
    #[arg(long)]
    pub blob_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let blob_store = match self.blob_backend {
            BlobBackend::Memory => ObjectStoreConfig::Memory,
            // an empty path is filled in with the state directory's blobs/
            BlobBackend::Local => ObjectStoreConfig::Local {
                path: self.blob_path.clone().unwrap_or_default(),
            },
        };
        let config = AppConfig {
            api_port: self.api_port,
            token_lifetime_secs: self.token_lifetime_secs,
            blob_store,
            ..AppConfig::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let output = format!(
            "Initialized stash directory at: {}\n\
             - Database: {}\n\
             - Signing key: {}\n\
             - Blobs: {:?}\n\
             - Config: {}\n\
             - API port: {}\n\
             - Token lifetime: {}s",
            state.stash_dir.display(),
            state.db_path.display(),
            state.key_path.display(),
            state.config.blob_store,
            state.config_path.display(),
            state.config.api_port,
            state.config.token_lifetime_secs,
        );

        Ok(output)
    }
}
