use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::embeddings::EmbeddingError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Input parse error: {0}")]
    InputParse(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::ServiceUnavailable(format!("language model: {e}"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<EmbeddingError> for AppError {
    fn from(e: EmbeddingError) -> Self {
        AppError::ServiceUnavailable(format!("embedding provider: {e}"))
    }
}

impl AppError {
    /// True for failures of an external collaborator rather than of the request.
    #[cfg(test)]
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            AppError::ServiceUnavailable(_) | AppError::VectorStore(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InputParse(msg) => {
                tracing::error!("Input parse error: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INPUT_PARSE_ERROR",
                    msg.clone(),
                )
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Collaborator failure: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "An upstream service is unavailable".to_string(),
                )
            }
            AppError::VectorStore(e) => {
                tracing::error!("Vector store error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "The vector store is unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
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
