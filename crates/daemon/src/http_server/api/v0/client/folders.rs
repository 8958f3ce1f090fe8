use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::FolderListing;

use crate::http_server::api::{Caller, HandlerError};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    /// Defaults to the caller's root folder
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

pub async fn create_handler(
    State(state): State<ServiceState>,
    Extension(Caller(account)): Extension<Caller>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Response, HandlerError> {
    let folder = state
        .stash()
        .create_folder(account.id, &req.name, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(folder)).into_response())
}

pub async fn list_handler(
    State(state): State<ServiceState>,
    Extension(Caller(account)): Extension<Caller>,
    Path(folder_id): Path<String>,
) -> Result<Json<FolderListing>, HandlerError> {
    let folder_id = Uuid::parse_str(&folder_id)
        .map_err(|_| HandlerError::bad_request("folder id is not a valid uuid"))?;
    let listing = state.stash().list_folder(account.id, folder_id).await?;
    Ok(Json(listing))
}
