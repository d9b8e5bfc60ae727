use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use logbook_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Responses are plain text, the pages are server rendered and have no
/// client-side error handling.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `logbook_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A page failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// The multipart body could not be read (malformed or over the size cap).
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, format!("Error: {msg}")),
                CoreError::Processing(msg) => {
                    tracing::error!(error = %msg, "File processing failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("File processing error: {msg}"),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Database error: {err}"),
                )
            }

            // --- HTTP-specific errors ---
            AppError::Template(err) => {
                tracing::error!(error = %err, "Template rendering failed");
                internal()
            }
            AppError::Multipart(err) => (err.status(), format!("Error: {}", err.body_text())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("Error: {msg}")),
        };

        (status, message).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "An internal error occurred".to_string(),
    )
}
