use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::{jwt::TokenError, password::HashError};

/// Failures reported by a `UserRepository` adapter.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("user not found")]
    NotFound,

    #[error("unique constraint '{constraint}' violated")]
    UniqueViolation { constraint: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt user row: {0}")]
    Corrupt(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse classification used to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    NotFound,
    State,
    Hashing,
    Token,
    Persistence,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid credentials")]
    Authentication,

    #[error("user not found")]
    NotFound,

    #[error("user status is not pending")]
    State,

    #[error("failed to hash password")]
    Hashing(#[source] HashError),

    #[error("failed to generate authentication token")]
    Token(#[source] TokenError),

    #[error("persistence failure")]
    Persistence(#[source] RepoError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Authentication => ErrorKind::Authentication,
            ServiceError::NotFound => ErrorKind::NotFound,
            ServiceError::State => ErrorKind::State,
            ServiceError::Hashing(_) => ErrorKind::Hashing,
            ServiceError::Token(_) => ErrorKind::Token,
            ServiceError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation | ErrorKind::State => StatusCode::BAD_REQUEST,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Hashing | ErrorKind::Token | ErrorKind::Persistence => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.kind().status();
        if status.is_server_error() {
            let cause = std::error::Error::source(&self)
                .map(|e| e.to_string())
                .unwrap_or_default();
            tracing::error!(kind = ?self.kind(), %cause, "{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
