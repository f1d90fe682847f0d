//! Error types for the fetch/cache/aggregate pipeline
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fetch Error Enum ==
/// Failure of a remote fetch.
///
/// Cloneable so a single outcome can be handed to every caller waiting on
/// the same in-flight fetch. None of these are retried by the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Response body could not be parsed or had the wrong shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Remote API answered with an error status
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Network level failure
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The fetch did not finish in time
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The caller performing the fetch went away before finishing it
    #[error("In-flight fetch abandoned for key: {0}")]
    Abandoned(String),

    /// Cached payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Serialization(err.to_string())
    }
}

// == Log Error Enum ==
/// Reasons a log response is unusable for aggregation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// Body has no `entries` array
    #[error("Log response has no entries collection")]
    MissingEntries,
}

// == App Error Enum ==
/// Error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A remote fetch failed
    #[error(transparent)]
    Fetch(FetchError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FetchError> for AppError {
    // Cached payloads that fail to decode are internal failures
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Serialization(msg) => AppError::Internal(msg),
            other => AppError::Fetch(other),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Fetch(FetchError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP surface.
pub type Result<T> = std::result::Result<T, AppError>;
