//! Common error types and handling for Tokochat

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that may cross the public boundary of the chat subsystem.
///
/// Assistant gateway failures are deliberately absent: they are absorbed
/// into the fallback reply and never reach a caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::Unexpected(_)
            | Error::Database(_)
            | Error::Serialization(_)
            | Error::StorageUnavailable(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Unexpected(_) => "UNEXPECTED_ERROR",
            Error::Database(_) | Error::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::Unauthenticated(_) => "UNAUTHENTICATED",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures of the persistence layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Database(_) | Error::StorageUnavailable(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Log internal errors with full context
        if matches!(status, StatusCode::INTERNAL_SERVER_ERROR) {
            tracing::error!(error = %self, code = error_code, "Internal server error");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
