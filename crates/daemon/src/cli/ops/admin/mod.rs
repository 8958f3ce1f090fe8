use clap::{Args, Subcommand};

use stash_daemon::http_server::api::client::{ApiClient, ApiError, Identity};

use crate::cli::op::{Op, OpContext};

mod credential;
mod login;
mod users;

crate::command_enum! {
    (Login, login::Login),
    (SetCredential, credential::SetCredential),
    (Users, users::Users),
    (AddUser, users::AddUser),
    (DelUser, users::DelUser),
}

pub type AdminCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Admin {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[async_trait::async_trait]
impl Op for Admin {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Credentials for administrator-gated endpoints.
#[derive(Args, Debug, Clone)]
pub struct AdminIdentity {
    /// Administrator login name
    #[arg(long, env = "STASH_USR")]
    pub usr: String,

    /// Token printed by `stash admin login`
    #[arg(long, env = "STASH_TOKEN", hide_env_values = true)]
    pub token: String,
}

impl AdminIdentity {
    fn client(&self, ctx: &OpContext) -> ApiClient {
        ctx.client.clone().with_identity(Identity {
            login_name: self.usr.clone(),
            token: self.token.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Api(#[from] ApiError),
}
