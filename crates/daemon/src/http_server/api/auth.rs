use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use common::prelude::{Account, StashError};

use super::HandlerError;
use crate::ServiceState;

/// Claimed login name
pub const USER_HEADER: &str = "usr";
/// Capability token issued at login
pub const TOKEN_HEADER: &str = "token";

/// The account a request was authenticated as.
#[derive(Debug, Clone)]
pub struct Caller(pub Account);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, HandlerError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StashError::Unauthorized.into())
}

fn identity(headers: &HeaderMap) -> Result<(&str, &str), HandlerError> {
    Ok((header(headers, USER_HEADER)?, header(headers, TOKEN_HEADER)?))
}

pub async fn require_administrator(
    State(state): State<ServiceState>,
    mut request: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    let (login_name, token) = identity(request.headers())?;
    let account = state
        .stash()
        .gate()
        .authenticate_as_administrator(login_name, token)
        .await?;

    request.extensions_mut().insert(Caller(account));
    Ok(next.run(request).await)
}

pub async fn require_user(
    State(state): State<ServiceState>,
    mut request: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    let (login_name, token) = identity(request.headers())?;
    let account = state
        .stash()
        .gate()
        .authenticate_as_user(login_name, token)
        .await?;

    request.extensions_mut().insert(Caller(account));
    Ok(next.run(request).await)
}
