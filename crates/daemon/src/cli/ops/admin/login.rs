use clap::Args;

use stash_daemon::http_server::api::v0::admin::AdminLoginRequest;

use super::AdminError;
use crate::cli::op::{Op, OpContext};

const RESET_REQUIRED: &str =
    "the factory credential is still in place; replace it with `stash admin set-credential`";

#[derive(Args, Debug, Clone)]
pub struct Login {
    #[command(flatten)]
    pub request: AdminLoginRequest,
}

#[async_trait::async_trait]
impl Op for Login {
    type Error = AdminError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.request.clone()).await?;

        match response.token {
            Some(token) if !response.requires_credential_reset => Ok(token),
            _ => Ok(RESET_REQUIRED.to_string()),
        }
    }
}
