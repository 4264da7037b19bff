//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kitab Server                           │
//! │                                                                         │
//! │  Handler: ApiResult<T>                                                  │
//! │       │                                                                 │
//! │       ├── ValidationError / CoreError ──► 400 VALIDATION_ERROR          │
//! │       ├── DbError::NotFound ────────────► 404 NOT_FOUND                 │
//! │       ├── DbError::UniqueViolation ─────► 409 DUPLICATE_NAME            │
//! │       ├── CoreError::HasReferences ─────► 400 HAS_REFERENCES            │
//! │       ├── SheetError (bad upload) ──────► 400 VALIDATION_ERROR          │
//! │       ├── shipping upstream ────────────► 400 / 500 UPSTREAM_ERROR      │
//! │       ├── missing session ──────────────► 401 UNAUTHORIZED              │
//! │       └── storage failure ──────────────► 500 STORAGE_ERROR (logged)    │
//! │                                                                         │
//! │  Body: { "code": "NOT_FOUND", "error": "Book not found: 7" }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kitab_core::{CoreError, ValidationError};
use kitab_db::DbError;
use kitab_sheet::SheetError;
use serde::Serialize;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "DUPLICATE_NAME",
///   "error": "Duplicate name: 'Kitab A' already exists"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    #[serde(rename = "error")]
    pub message: String,

    #[serde(skip)]
    status_override: Option<StatusCode>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Name already taken (409)
    DuplicateName,

    /// Resource not found (404)
    NotFound,

    /// Delete refused while sales reference the row (400)
    HasReferences,

    /// Shipping service failed (400 or 500)
    UpstreamError,

    /// Database operation failed (500)
    StorageError,

    /// No valid admin session (401)
    Unauthorized,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::HasReferences | ErrorCode::UpstreamError => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::DuplicateName => StatusCode::CONFLICT,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::StorageError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            status_override: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    pub fn unauthorized() -> Self {
        ApiError::new(ErrorCode::Unauthorized, "Login required")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// The shipping service answered with an error body.
    pub fn upstream_rejected(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::UpstreamError, message)
    }

    /// The shipping service could not be reached.
    pub fn upstream_unreachable(message: impl Into<String>) -> Self {
        ApiError {
            status_override: Some(StatusCode::INTERNAL_SERVER_ERROR),
            ..ApiError::new(ErrorCode::UpstreamError, message)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status_override.unwrap_or_else(|| self.code.status())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::DuplicateName, err.to_string()),
            DbError::Domain(core) => core.into(),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                tracing::error!("Database unavailable: {}", err);
                ApiError::new(ErrorCode::StorageError, "Database unavailable")
            }
            DbError::MigrationFailed(_) | DbError::QueryFailed(_) | DbError::Internal(_) => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", err);
                ApiError::new(ErrorCode::StorageError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::HasReferences { .. } => ApiError::new(ErrorCode::HasReferences, err.to_string()),
            CoreError::ConfirmationMismatch => ApiError::validation(err.to_string()),
            CoreError::AmountOverflow { .. } => ApiError::validation(err.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<SheetError> for ApiError {
    fn from(err: SheetError) -> Self {
        if err.is_client_error() {
            ApiError::validation(err.to_string())
        } else {
            tracing::error!("Spreadsheet export failed: {}", err);
            ApiError::internal("Failed to build spreadsheet")
        }
    }
}

/// Malformed or mistyped JSON bodies answer in the API's own error shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================
