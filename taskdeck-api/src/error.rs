//! Error Types for the taskdeck API
//!
//! Every failure leaving a handler is an [`ApiError`]: an [`ErrorCode`] that
//! fixes the HTTP status, a human-readable message and optional details.
//! Errors are serialized as JSON.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskdeck_core::{CodecError, ConfigError, StoreError, ValidationError};
use taskdeck_storage::FillError;

use crate::auth::AuthError;
use crate::constants::{
    MSG_EMPTY_TITLE, MSG_FETCH_FAILED, MSG_INVALID_TASK_ID, MSG_USERNAME_TAKEN,
    MSG_WRONG_CREDENTIALS,
};
use crate::services::{TaskServiceError, UserServiceError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each code maps to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401, 403)
    // ========================================================================
    /// Request lacks credentials
    Unauthorized,

    /// Credentials are valid but the resource belongs to someone else
    Forbidden,

    /// API key is malformed or unknown
    InvalidToken,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request body could not be decoded
    InvalidInput,

    /// Field format is incorrect
    InvalidFormat,

    /// Login with an unknown username or a wrong password
    InvalidCredentials,

    /// Signup with a username that is already registered
    DuplicateUsername,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// The durable store rejected or failed an operation
    StoreError,

    /// The durable store could not be reached
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized | ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,

            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::InvalidFormat
            | ErrorCode::InvalidCredentials
            | ErrorCode::DuplicateUsername => StatusCode::BAD_REQUEST,

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError | ErrorCode::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::InvalidToken => "Invalid API key",

            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::InvalidFormat => "Invalid field format",
            ErrorCode::InvalidCredentials => MSG_WRONG_CREDENTIALS,
            ErrorCode::DuplicateUsername => MSG_USERNAME_TAKEN,

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StoreError => "Store operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, message)
    }

    pub fn invalid_credentials() -> Self {
        Self::from_code(ErrorCode::InvalidCredentials)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn store_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM LIBRARY ERRORS
// ============================================================================

/// Store details are logged, never returned to the caller.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Store error");
        match err {
            StoreError::Unavailable { .. } => {
                ApiError::service_unavailable("Store temporarily unavailable")
            }
            _ => ApiError::from_code(ErrorCode::StoreError),
        }
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        tracing::error!(error = %err, "Stored record could not be decoded");
        ApiError::internal_error("Stored record is malformed")
    }
}

/// Startup configuration problems.
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!(error = %err, "Invalid configuration");
        ApiError::internal_error(format!("Invalid configuration: {}", err))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match &err {
            ValidationError::RequiredFieldMissing { field } if field == "title" => {
                ApiError::validation_failed(MSG_EMPTY_TITLE)
            }
            _ => ApiError::validation_failed(err.to_string()),
        }
    }
}

impl From<FillError> for ApiError {
    fn from(err: FillError) -> Self {
        tracing::error!(error = %err, "Task fill failed");
        ApiError::internal_error(MSG_FETCH_FAILED)
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::Validation(e) => e.into(),
            TaskServiceError::Forbidden { task_id } => {
                ApiError::forbidden(format!("Task {} belongs to another user", task_id))
            }
            TaskServiceError::Store { operation, source } => {
                tracing::error!(operation = %operation, error = %source, "Task store operation failed");
                ApiError::store_error(operation.failure_message())
            }
            TaskServiceError::Codec(e) => e.into(),
            TaskServiceError::Fill(e) => e.into(),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(e) => e.into(),
            UserServiceError::UsernameTaken { .. } => ApiError::from_code(ErrorCode::DuplicateUsername),
            UserServiceError::InvalidCredentials => ApiError::invalid_credentials(),
            UserServiceError::Store(e) => e.into(),
            UserServiceError::Codec(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::unauthorized("Missing Authorization header"),
            AuthError::InvalidScheme => {
                ApiError::invalid_token("Authorization header must use the Bearer scheme")
            }
            AuthError::UnknownKey => ApiError::invalid_token("Unknown API key"),
            AuthError::Store(e) => e.into(),
            AuthError::Codec(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        ApiError::invalid_input(rejection.body_text())
    }
}

/// Path ids that do not parse as UUIDs.
impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ApiError::invalid_format(MSG_INVALID_TASK_ID).with_details(serde_json::json!({
            "reason": err.to_string(),
        }))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
