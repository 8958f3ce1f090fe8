use std::fmt::Display;

/// Failure taxonomy shared by every core operation.
///
/// Store, hashing, signing and blob failures never leak their cause past a
/// component boundary: they are logged where they happen and surface as
/// [`StashError::Internal`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StashError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid credentials or token")]
    Unauthorized,
    #[error("access to this resource is forbidden")]
    Forbidden,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error")]
    Internal,
}

impl StashError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn bad_request(what: impl Into<String>) -> Self {
        Self::BadRequest(what.into())
    }

    /// Log `err` with `context` and collapse it into [`StashError::Internal`].
    pub fn internal<E: Display>(context: &str, err: E) -> Self {
        tracing::error!(error = %err, "{}", context);
        Self::Internal
    }
}

pub type Result<T> = std::result::Result<T, StashError>;
