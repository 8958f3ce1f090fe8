use axum::extract::{Json, State};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::AdminLogin;

use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::http_server::api::HandlerError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct AdminLoginRequest {
    /// Administrator login name
    #[arg(long, default_value = "admin")]
    pub login_name: String,

    #[arg(long)]
    pub password: String,
}

/// A token is only issued once the factory credential has been replaced.
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLogin>, HandlerError> {
    let login = state
        .stash()
        .administrator_login(&req.login_name, &req.password)
        .await?;
    Ok(Json(login))
}

impl ApiRequest for AdminLoginRequest {
    type Response = AdminLogin;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client
            .post(endpoint(base_url, "/api/v0/admin/login"))
            .json(&self)
    }
}
