//! API error types and conversions

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures of the HTTP surface itself
///
/// Protocol outcomes such as `not_writable` are not errors here; they travel
/// inside a successful [`super::types::OperationResponse`].
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be decoded
    InvalidRequest(String),

    /// Store infrastructure failure
    StoreError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::StoreError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidOid(_) => ApiError::InvalidRequest(err.to_string()),
            _ => ApiError::StoreError(err.to_string()),
        }
    }
}

