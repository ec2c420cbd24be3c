//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Potu POS                               │
//! │                                                                         │
//! │  Handler ──► Service ──► Result<T, ServiceError>                        │
//! │                               │                                         │
//! │            ┌──────────────────┴───────────────────┐                     │
//! │            ▼                                      ▼                     │
//! │   CoreError (domain)                     DbError (storage)              │
//! │   *NotFound       → 404                  RecordNotFound → 404           │
//! │   Validation      → 400                  anything else  → 500, logged   │
//! │   Duplicate/InUse/AlreadyConverted → 409                                │
//! │            │                                      │                     │
//! │            └──────────────► ApiError ◄────────────┘                     │
//! │                               │                                         │
//! │                               ▼                                         │
//! │        { "error": "Product not found", "code": "NOT_FOUND" }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged in full and answered with a generic
//! message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use potu_core::{CoreError, ValidationError};
use potu_db::DbError;
use serde::Serialize;

use crate::services::ServiceError;

/// Error body returned by every failing endpoint.
///
/// ```json
/// { "error": "Category already exists", "code": "CONFLICT" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    #[serde(rename = "error")]
    pub message: String,

    /// Set when a category delete is refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products_count: Option<usize>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// State conflict: duplicate, in use, already converted (409)
    Conflict,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            products_count: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_not_found() {
            return ApiError::not_found(err.to_string());
        }
        match err {
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::CategoryInUse { count, .. } => ApiError {
                products_count: Some(count),
                ..ApiError::new(ErrorCode::Conflict, err.to_string())
            },
            CoreError::DuplicateCategory { .. } | CoreError::AlreadyConverted { .. } => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            other => {
                tracing::error!("Unmapped domain error: {}", other);
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::RecordNotFound { collection, id } => {
                tracing::debug!(collection = %collection, id = id, "Record not found");
                ApiError::not_found("Record not found")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::internal("Database connection failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::internal("Database transaction failed")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", other);
                ApiError::internal("Database operation failed")
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Storage(e) => e.into(),
        }
    }
}

/// Malformed or non-JSON bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// `Json` extractor whose rejection is an [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Non-numeric ids and other unparseable path segments.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// `Path` extractor whose rejection is an [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query` extractor whose rejection is an [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
