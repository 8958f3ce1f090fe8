use axum::extract::{Json, State};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::http_server::api::HandlerError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct SetCredentialRequest {
    /// New administrator login name
    #[arg(long)]
    pub login_name: String,

    /// New administrator password
    #[arg(long)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCredentialResponse {
    pub login_name: String,
}

/// Replace the factory credential. Only the first call succeeds; later ones
/// get a 409.
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<SetCredentialRequest>,
) -> Result<Json<SetCredentialResponse>, HandlerError> {
    state
        .stash()
        .set_initial_admin_credential(&req.login_name, &req.password)
        .await?;
    Ok(Json(SetCredentialResponse {
        login_name: req.login_name,
    }))
}

impl ApiRequest for SetCredentialRequest {
    type Response = SetCredentialResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client
            .post(endpoint(base_url, "/api/v0/admin/credential"))
            .json(&self)
    }
}
