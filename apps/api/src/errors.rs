use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Retrieval error: {0:#}")]
    Retrieval(anyhow::Error),

    #[error("Write error: {0:#}")]
    Write(anyhow::Error),

    #[error("Report generation error: {0}")]
    Generation(String),
}

impl AppError {
    pub fn retrieval(e: anyhow::Error) -> Self {
        AppError::Retrieval(e)
    }

    pub fn write(e: anyhow::Error) -> Self {
        AppError::Write(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Retrieval(e) => {
                tracing::error!("Retrieval error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RETRIEVAL_ERROR",
                    "Records could not be retrieved".to_string(),
                )
            }
            AppError::Write(e) => {
                tracing::error!("Write error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "WRITE_ERROR",
                    "The record could not be saved".to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("Report generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_ERROR",
                    "The report could not be generated".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
