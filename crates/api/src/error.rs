//! API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required query parameter absent
    #[error("Missing query parameter: {0}")]
    MissingParameter(&'static str),

    /// Query string could not be parsed
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    /// Storage failed while serving the request
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// One entry of a validation error body
#[derive(Debug, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub loc: Vec<&'static str>,
    pub msg: String,
    pub input: Option<String>,
}

/// Body of a 422 response: `{"detail": [issue, ...]}`
#[derive(Debug, Serialize)]
pub struct ValidationBody {
    pub detail: Vec<ValidationIssue>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingParameter(name) => validation_error(ValidationIssue {
                kind: "missing",
                loc: vec!["query", name],
                msg: "Field required".to_string(),
                input: None,
            }),
            ApiError::InvalidQuery(msg) => validation_error(ValidationIssue {
                kind: "value_error",
                loc: vec!["query"],
                msg,
                input: None,
            }),
            ApiError::Storage(err) => {
                error!("Request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

fn validation_error(issue: ValidationIssue) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ValidationBody {
            detail: vec![issue],
        }),
    )
        .into_response()
}
