//! # HTTP Errors
//!
//! Maps inventory failures to status codes and a JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::inventory::InventoryError;

/// Message shown to callers for backend failures
pub const INTERNAL_MESSAGE: &str = "internal storage error";

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Handler failures
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AssetNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Inventory(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::AssetNotFound(_) => "NOT_FOUND",
            ApiError::Inventory(e) => e.code(),
        }
    }

    /// Message safe to show a caller
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Inventory(e) if e.is_internal() => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.public_message(),
            code: err.code().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(&self));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_store::RecordStoreError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(InventoryError::NotFound("b".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(InventoryError::AlreadyBorrowed {
                book_id: "b".into(),
                user_id: "u".into()
            })
            .status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_storage_failures_are_not_leaked() {
        let err = ApiError::from(InventoryError::StorageFailure(RecordStoreError::IoError(
            "/var/lib/libris/records.journal: disk full".into(),
        )));
        let body = ErrorResponse::from(&err);
        assert_eq!(body.error, INTERNAL_MESSAGE);
        assert_eq!(body.code, "STORAGE_FAILURE");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_message_is_kept() {
        let err = ApiError::from(InventoryError::invalid("price", "must be a positive number"));
        assert_eq!(
            ErrorResponse::from(&err).error,
            "Invalid price: must be a positive number"
        );
    }
}
