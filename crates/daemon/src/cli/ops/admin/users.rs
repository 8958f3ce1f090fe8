use clap::Args;

use stash_daemon::http_server::api::v0::admin::{
    CreateUserRequest, DeleteUserRequest, ListUsersRequest,
};

use super::{AdminError, AdminIdentity};
use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Users {
    #[command(flatten)]
    pub identity: AdminIdentity,
}

#[async_trait::async_trait]
impl Op for Users {
    type Error = AdminError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = self.identity.client(ctx).call(ListUsersRequest).await?;
        if response.users.is_empty() {
            return Ok("no users".to_string());
        }
        Ok(response.users.join("\n"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddUser {
    #[command(flatten)]
    pub identity: AdminIdentity,

    #[command(flatten)]
    pub request: CreateUserRequest,
}

#[async_trait::async_trait]
impl Op for AddUser {
    type Error = AdminError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = self
            .identity
            .client(ctx)
            .call(self.request.clone())
            .await?;
        Ok(format!(
            "created user {} ({})",
            response.login_name, response.account_id
        ))
    }
}

#[derive(Args, Debug, Clone)]
pub struct DelUser {
    #[command(flatten)]
    pub identity: AdminIdentity,

    #[command(flatten)]
    pub request: DeleteUserRequest,
}

#[async_trait::async_trait]
impl Op for DelUser {
    type Error = AdminError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = self
            .identity
            .client(ctx)
            .call(self.request.clone())
            .await?;
        Ok(format!("deleted user {}", response.login_name))
    }
}
