//! HTTP error mapping for the policyQA server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use policyqa_core::RagError;
use serde::Serialize;
use thiserror::Error;

/// Pipeline error carried to the HTTP boundary
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ServerError(#[from] pub RagError);

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            RagError::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "DOCUMENT_NOT_FOUND"),
            RagError::Extraction(_) => (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_FAILED"),
            RagError::Embedding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EMBEDDING_FAILED"),
            RagError::Reasoning(_) => (StatusCode::BAD_GATEWAY, "REASONING_FAILED"),
            RagError::InvalidConfiguration(_) => (StatusCode::BAD_REQUEST, "INVALID_CONFIGURATION"),
            RagError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        };

        let body = ErrorResponse {
            success: false,
            error: self.0.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
