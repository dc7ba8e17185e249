//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and the
//! single place where core error kinds are mapped to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use peer_review_core::ports::WorkflowError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the workflow core.
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Workflow(e) => match e {
                WorkflowError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
                WorkflowError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
                // Lifecycle-state violations surface as bad requests, like
                // the other input errors.
                WorkflowError::InvalidInput(m) | WorkflowError::InvalidState(m) => {
                    (StatusCode::BAD_REQUEST, m.clone())
                }
                WorkflowError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
                WorkflowError::Fault(m) => {
                    error!("store fault: {m}");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
                }
            },
            other => {
                error!("unhandled error: {other}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
