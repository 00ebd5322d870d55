pub mod auth;
pub mod blog;
pub mod image;
pub mod listing;
pub mod resources;
pub mod slug;

use thiserror::Error;

/// Failures a service call can report to its caller. Anything that is not the
/// caller's fault ends up in `Internal`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
