//! Error responses.
//!
//! # Responsibilities
//! - Map collaborator and provider failures to HTTP status codes
//! - Keep transport details out of response bodies
//!
//! # Design Decisions
//! - Every error body is `{"error": "<summary>"}`
//! - Details belong in the request log, not the response

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Error taxonomy surfaced to callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing required input.
    #[error("{0}")]
    BadRequest(String),

    /// OAuth state validation failed.
    #[error("{0}")]
    Forbidden(String),

    /// Requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The identity provider failed or answered nonsense.
    #[error("{0}")]
    Upstream(String),

    /// A dependency could not be reached in time.
    #[error("{0}")]
    Unavailable(String),

    /// Unexpected local fault.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => ApiError::BadRequest("email already registered".into()),
            StoreError::Unavailable(_) | StoreError::Query(_) => {
                ApiError::Unavailable("user store unavailable".into())
            }
        }
    }
}

/// Body of the 500 produced when a handler panics.
pub fn internal_error_response() -> Response {
    ApiError::Internal("internal server error".into()).into_response()
}
