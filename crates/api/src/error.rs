use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use rubric_core::error::CoreError;
use rubric_db::error::PersistenceError;
use rubric_render::RenderError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors, [`PersistenceError`] for store
/// failures, and [`RenderError`] for gateway failures. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `rubric_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A store failure from `rubric_db`.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A rendering gateway failure from `rubric_render`.
    #[error("Render gateway failure: {0}")]
    Render(#[from] RenderError),

    /// A raw database error (transaction plumbing).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
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
                CoreError::InvalidRegion(msg) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_REGION",
                    format!("Invalid region: {msg}"),
                ),
                CoreError::EmptyComment => (
                    StatusCode::BAD_REQUEST,
                    "EMPTY_COMMENT",
                    "Annotation comment must not be empty".to_string(),
                ),
                CoreError::DevolutionMissingJustification => (
                    StatusCode::BAD_REQUEST,
                    "DEVOLUTION_MISSING_JUSTIFICATION",
                    "A devolution requires a non-empty justification".to_string(),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Store failures ---
            AppError::Persistence(err) => match err {
                PersistenceError::Transient(source) => {
                    tracing::error!(error = %source, "Transient store failure");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORE_UNAVAILABLE",
                        "The store is temporarily unavailable, please retry".to_string(),
                    )
                }
                PersistenceError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
            },

            // --- Rendering gateway failures ---
            AppError::Render(err) => {
                tracing::warn!(error = %err, "Render gateway failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "RENDER_GATEWAY_ERROR",
                    "The rendering service is unavailable, please retry".to_string(),
                )
            }

            // --- Raw database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
