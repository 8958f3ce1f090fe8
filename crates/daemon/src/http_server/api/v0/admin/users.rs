use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::http_server::api::HandlerError;
use crate::ServiceState;

const USERS_PATH: &str = "/api/v0/admin/users";

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ListUsersRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct CreateUserRequest {
    #[arg(long)]
    pub login_name: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub account_id: Uuid,
    pub login_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct DeleteUserRequest {
    #[arg(long)]
    pub login_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub login_name: String,
}

pub async fn list_handler(
    State(state): State<ServiceState>,
) -> Result<Json<ListUsersResponse>, HandlerError> {
    let users = state.stash().list_users().await?;
    Ok(Json(ListUsersResponse { users }))
}

pub async fn create_handler(
    State(state): State<ServiceState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Response, HandlerError> {
    let account = state
        .stash()
        .create_user(&req.login_name, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            account_id: account.id,
            login_name: account.login_name,
        }),
    )
        .into_response())
}

/// Removes the user with its folders and files.
pub async fn delete_handler(
    State(state): State<ServiceState>,
    Path(username): Path<String>,
) -> Result<Json<DeleteUserResponse>, HandlerError> {
    state.stash().delete_user(&username).await?;
    Ok(Json(DeleteUserResponse {
        login_name: username,
    }))
}

impl ApiRequest for ListUsersRequest {
    type Response = ListUsersResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, USERS_PATH))
    }
}

impl ApiRequest for CreateUserRequest {
    type Response = CreateUserResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.post(endpoint(base_url, USERS_PATH)).json(&self)
    }
}

impl ApiRequest for DeleteUserRequest {
    type Response = DeleteUserResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let mut url = endpoint(base_url, USERS_PATH);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&self.login_name);
        }
        client.delete(url)
    }
}
