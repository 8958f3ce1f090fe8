use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};

use common::prelude::UserLogin;

use crate::http_server::api::HandlerError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLoginRequest {
    pub login_name: String,
    pub password: String,
}

/// Issues a user token and makes sure the account has its root folder.
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<UserLoginRequest>,
) -> Result<Json<UserLogin>, HandlerError> {
    let login = state
        .stash()
        .user_login(&req.login_name, &req.password)
        .await?;
    Ok(Json(login))
}
