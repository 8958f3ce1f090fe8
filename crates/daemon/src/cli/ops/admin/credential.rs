use clap::Args;

use stash_daemon::http_server::api::v0::admin::SetCredentialRequest;

use super::AdminError;
use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct SetCredential {
    #[command(flatten)]
    pub request: SetCredentialRequest,
}

#[async_trait::async_trait]
impl Op for SetCredential {
    type Error = AdminError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.request.clone()).await?;
        Ok(format!(
            "administrator credential set, log in as {}",
            response.login_name
        ))
    }
}
