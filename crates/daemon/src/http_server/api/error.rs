use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use common::prelude::StashError;

/// A failed core operation, rendered as `{"error": "..."}`.
///
/// Internal failures were already logged where they happened and never show
/// their cause to the caller.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct HandlerError(#[from] StashError);

impl HandlerError {
    pub fn bad_request(what: impl Into<String>) -> Self {
        Self(StashError::bad_request(what))
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            StashError::NotFound(_) => StatusCode::NOT_FOUND,
            StashError::Unauthorized => StatusCode::UNAUTHORIZED,
            StashError::Forbidden => StatusCode::FORBIDDEN,
            StashError::Conflict(_) => StatusCode::CONFLICT,
            StashError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StashError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = %status, error = %self.0, "request failed");
        let body = serde_json::json!({"error": self.0.to_string()});
        (status, Json(body)).into_response()
    }
}
