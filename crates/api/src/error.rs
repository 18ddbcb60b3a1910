use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reelq_core::error::CoreError;
use reelq_pipeline::{AdminError, SubmitError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and the pipeline's rejection types and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `reelq_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A submission refused by the dispatcher.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// An admin query refused or failed.
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Config(msg) => {
                    tracing::error!(error = %msg, "Configuration error");
                    internal()
                }
            },

            // --- Admission ---
            AppError::Submit(err) => match err {
                SubmitError::InvalidLocator(_) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_LOCATOR",
                    err.user_message().to_string(),
                ),
                SubmitError::RateLimited(_) => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMITED",
                    err.user_message().to_string(),
                ),
                SubmitError::NotAuthorized(_) => (
                    StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    err.user_message().to_string(),
                ),
                SubmitError::Store(db) => classify_sqlx_error(db),
            },

            // --- Admin queries ---
            AppError::Admin(err) => match err {
                AdminError::Forbidden(_) => (
                    StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    reelq_core::messages::MSG_NOT_ADMIN.to_string(),
                ),
                AdminError::Store(db) => classify_sqlx_error(db),
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// `RowNotFound` maps to 404; everything else maps to 500 with a sanitized
/// message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
