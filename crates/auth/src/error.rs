//! Authentication errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Authentication error
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingAuthorization,
    InvalidAuthorizationFormat,
    InvalidToken,
    MissingSubject,
}

impl AuthError {
    fn parts(&self) -> (&'static str, &'static str) {
        match self {
            AuthError::MissingAuthorization => {
                ("MISSING_AUTHORIZATION", "Authorization header required")
            }
            AuthError::InvalidAuthorizationFormat => (
                "INVALID_AUTHORIZATION",
                "Invalid authorization header format",
            ),
            AuthError::InvalidToken => ("INVALID_TOKEN", "Invalid or expired token"),
            AuthError::MissingSubject => ("MISSING_SUBJECT", "Token does not identify a user"),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parts().1)
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        // Every auth failure means "no resolvable owner"
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
