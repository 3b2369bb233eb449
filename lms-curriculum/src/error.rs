//! Error types for lms-curriculum
//!
//! Only two resolver failures ever reach a caller: invalid input and "no data
//! anywhere". Source-level failures are absorbed by the fallback chain.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message surfaced when every source came up empty and samples are disabled
pub const NO_CURRICULUM_MESSAGE: &str = "No curriculum data available";

/// Resolver error
///
/// `Clone` so one in-flight result can be handed to every waiting caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Rejected before any network activity
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No source produced data and sample fallback was not permitted
    #[error("No curriculum data available")]
    NoCurriculum,
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidInput(msg) => ApiError::BadRequest(msg),
            ResolveError::NoCurriculum => ApiError::NotFound(NO_CURRICULUM_MESSAGE.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
