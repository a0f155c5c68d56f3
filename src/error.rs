use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// The input is not an absolute http/https URL.
    #[error("Invalid URL provided")]
    InvalidUrl,

    /// Slug decryption/authentication failure.
    ///
    /// Collapses "malformed", "tampered" and "wrong key" into one
    /// externally-indistinguishable error so callers cannot be used as a
    /// decryption oracle.
    #[error("Invalid or tampered link")]
    InvalidOrTamperedLink,

    /// An authorization error (missing or wrong API key).
    #[error("Invalid or missing API key")]
    Unauthorized,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidUrl => {
                tracing::debug!("Invalid URL submitted");
                (StatusCode::BAD_REQUEST, "Invalid URL format".to_string())
            }

            AppError::InvalidOrTamperedLink => {
                tracing::warn!("Invalid or tampered link presented");
                (StatusCode::NOT_FOUND, "Invalid or expired link".to_string())
            }

            AppError::Unauthorized => {
                tracing::warn!("API key rejected");
                (StatusCode::UNAUTHORIZED, "Invalid or missing API key".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Encryption error".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
