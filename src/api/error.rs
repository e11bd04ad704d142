use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::handlers::{HandlerError, RegistryError};
use crate::userdata::DecodeError;

use super::utils::UnescapeError;

/// Errors surfaced on resource and manifest routes
///
/// The protocol expects bare status codes, so the response body is always
/// empty. The message only ends up in the logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
    /// Status chosen by the manifest callback
    #[error("rejected with status {0}")]
    Status(StatusCode),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Status(status) => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        self.status_code().into_response()
    }
}

impl From<UnescapeError> for ApiError {
    fn from(value: UnescapeError) -> Self {
        ApiError::BadRequest(value.to_string())
    }
}

impl From<DecodeError> for ApiError {
    fn from(value: DecodeError) -> Self {
        ApiError::BadRequest(value.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(value: RegistryError) -> Self {
        ApiError::NotFound(value.to_string())
    }
}

impl From<HandlerError> for ApiError {
    fn from(value: HandlerError) -> Self {
        match value {
            HandlerError::NotFound => ApiError::NotFound(value.to_string()),
            HandlerError::BadRequest(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::Internal(value.to_string())
    }
}
