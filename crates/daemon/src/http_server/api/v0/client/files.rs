use axum::body::Body;
use axum::extract::{Json, Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http_server::api::{Caller, HandlerError};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileResponse {
    pub content_key: String,
}

/// Multipart upload with a `folder_id`, an optional `filename` and a `file`
/// part. The display name falls back to the uploaded file's name.
pub async fn upload_handler(
    State(state): State<ServiceState>,
    Extension(Caller(account)): Extension<Caller>,
    mut multipart: Multipart,
) -> Result<Response, HandlerError> {
    let mut folder_id: Option<Uuid> = None;
    let mut display_name: Option<String> = None;
    let mut upload: Option<(Option<String>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("multipart parsing error: {}", e);
        HandlerError::bad_request(e.to_string())
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "folder_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| HandlerError::bad_request(e.to_string()))?;
                folder_id = Some(
                    Uuid::parse_str(text.trim())
                        .map_err(|_| HandlerError::bad_request("folder_id is not a valid uuid"))?,
                );
            }
            "filename" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| HandlerError::bad_request(e.to_string()))?;
                display_name = Some(text);
            }
            "file" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| HandlerError::bad_request(e.to_string()))?;
                upload = Some((file_name, data));
            }
            _ => {
                tracing::debug!("ignoring unknown field: {}", field_name);
            }
        }
    }

    let folder_id = folder_id.ok_or_else(|| HandlerError::bad_request("folder_id is required"))?;
    let (file_name, data) = upload.ok_or_else(|| HandlerError::bad_request("file is required"))?;
    let display_name = display_name
        .filter(|name| !name.is_empty())
        .or(file_name)
        .ok_or_else(|| HandlerError::bad_request("filename is required"))?;

    let record = state
        .stash()
        .store_file(account.id, folder_id, &display_name, data)
        .await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// Streams the bytes back as an attachment named after the record.
pub async fn download_handler(
    State(state): State<ServiceState>,
    Extension(Caller(account)): Extension<Caller>,
    Path(content_key): Path<String>,
) -> Result<Response, HandlerError> {
    let (record, data) = state
        .stash()
        .read_file(&account.login_name, &content_key)
        .await?;

    let mime = mime_guess::from_path(&record.display_name).first_or_octet_stream();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_name(&record.display_name)
    );

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, mime.to_string()),
            (CONTENT_DISPOSITION, disposition),
            (CONTENT_LENGTH, data.len().to_string()),
        ],
        Body::from(data),
    )
        .into_response())
}

pub async fn delete_handler(
    State(state): State<ServiceState>,
    Extension(Caller(account)): Extension<Caller>,
    Path(content_key): Path<String>,
) -> Result<Json<DeleteFileResponse>, HandlerError> {
    state
        .stash()
        .delete_file(&account.login_name, &content_key)
        .await?;
    Ok(Json(DeleteFileResponse { content_key }))
}

/// Display names are free text; keep the header value quoted-string safe.
fn attachment_name(display_name: &str) -> String {
    display_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_name() {
        assert_eq!(attachment_name("report.pdf"), "report.pdf");
        assert_eq!(attachment_name("say \"hi\".txt"), "say _hi_.txt");
        assert_eq!(attachment_name("résumé.doc"), "r_sum_.doc");
        assert_eq!(attachment_name("a\\b"), "a_b");
    }
}
