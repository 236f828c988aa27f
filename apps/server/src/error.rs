//! Error types for the HTTP API.
//!
//! Every failure leaves the server as one JSON body:
//!
//! ```text
//! HTTP/1.1 409 Conflict
//! { "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for Claw Hammer: available 3, requested 5",
//!   "details": { "product": "Claw Hammer", "available": 3, "requested": 5 } }
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use madeh_core::CoreError;
use madeh_db::DbError;

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    PayloadTooLarge,
    ValidationError,
    EmptyCart,
    InvalidCsv,
    InvalidBackup,
    Unauthorized,
    Forbidden,
    NotFound,
    InsufficientStock,
    OutOfStock,
    Duplicate,
    Conflict,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest
            | ErrorCode::ValidationError
            | ErrorCode::EmptyCart
            | ErrorCode::InvalidCsv
            | ErrorCode::InvalidBackup => StatusCode::BAD_REQUEST,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock
            | ErrorCode::OutOfStock
            | ErrorCode::Duplicate
            | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error returned by every handler.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Logs the cause and hides it from the client.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "Request failed");
        Self::new(ErrorCode::Internal, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(_) | CoreError::PurchaseNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, message)
            }
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => ApiError {
                code: ErrorCode::InsufficientStock,
                message,
                details: Some(json!({
                    "product": product,
                    "available": available,
                    "requested": requested,
                })),
            },
            CoreError::OutOfStock(_) => ApiError::new(ErrorCode::OutOfStock, message),
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, message),
            CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::Validation(_) => ApiError::new(ErrorCode::ValidationError, message),
            CoreError::InvalidBackup(_) => ApiError::new(ErrorCode::InvalidBackup, message),
            CoreError::Csv(_) => ApiError::new(ErrorCode::InvalidCsv, message),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let message = err.to_string();
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, message),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::Duplicate, message),
            DbError::ForeignKeyViolation { .. } => ApiError::new(
                ErrorCode::Conflict,
                "Record is referenced by, or refers to, records that do not allow this change",
            ),
            DbError::CheckViolation { .. } => ApiError::new(ErrorCode::ValidationError, message),
            other => ApiError::internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::new(ErrorCode::PayloadTooLarge, rejection.body_text());
        }
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}
