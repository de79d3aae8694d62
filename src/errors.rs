// ABOUTME: Unified error handling with standard error codes and HTTP responses
// ABOUTME: Maps validation, auth, not-found, conflict and integrity failures to JSON bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Error handling
//!
//! Every fallible operation in the server returns [`AppResult`]. Errors carry
//! an [`ErrorCode`] that decides the HTTP status, a user-facing message, and
//! optional structured `details`. Server-side failures (5xx) are logged in
//! full and rendered to clients as a generic message with the underlying
//! message in `details`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lms_core::DomainError;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

/// Standard error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or semantically invalid input
    InvalidInput,
    /// A required field was missing
    MissingRequiredField,
    /// No caller identity supplied
    AuthRequired,
    /// Caller identity could not be verified
    AuthInvalid,
    /// Caller is known but not allowed (not enrolled, not admin, wrong site)
    PermissionDenied,
    /// Maximum assessment attempts reached
    AttemptLimitExceeded,
    /// Entity does not exist (or is not visible to the caller's site)
    ResourceNotFound,
    /// Entity already exists or the operation was already performed
    ResourceAlreadyExists,
    /// Stored data failed validation on read
    IntegrityViolation,
    /// Database operation failed
    DatabaseError,
    /// Configuration problem
    ConfigError,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::MissingRequiredField => StatusCode::BAD_REQUEST,
            Self::AuthRequired | Self::AuthInvalid => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied | Self::AttemptLimitExceeded => StatusCode::FORBIDDEN,
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::ResourceAlreadyExists => StatusCode::CONFLICT,
            Self::IntegrityViolation
            | Self::DatabaseError
            | Self::ConfigError
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Generic message shown to clients instead of internal detail
    #[must_use]
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::IntegrityViolation => "Stored content is invalid",
            Self::DatabaseError => "Database operation failed",
            Self::ConfigError => "Server is misconfigured",
            _ => "Internal server error",
        }
    }
}

/// Application error
#[derive(Debug, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct AppError {
    /// Error classification
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional structured details returned to the client
    pub details: Option<Value>,
}

/// Result alias used across the server
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create an error with an explicit code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Invalid input (400)
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing field (400)
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required field: {field}"),
        )
    }

    /// No identity (401)
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Bad identity (401)
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Not allowed (403)
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Attempt limit reached (403)
    pub fn attempt_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AttemptLimitExceeded, message)
    }

    /// Not found (404)
    pub fn not_found(what: impl Into<String>) -> Self {
        let what = what.into();
        Self::new(ErrorCode::ResourceNotFound, format!("{what} not found"))
    }

    /// Conflict (409)
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Stored data is corrupt (500)
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IntegrityViolation, message)
    }

    /// Database failure (500)
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration failure (500)
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal failure (500)
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// HTTP status for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {e}"))
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Invalid(message) => Self::invalid_input(message),
            DomainError::Corrupt(message) => Self::integrity(message),
        }
    }
}

/// JSON body for error responses
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = if status.is_server_error() {
            error!(code = ?self.code, details = ?self.details, "Request failed: {}", self.message);
            ErrorBody {
                error: self.code.public_message().to_owned(),
                details: Some(Value::String(self.message)),
            }
        } else {
            warn!(
                code = ?self.code,
                status = status.as_u16(),
                "Request rejected: {}",
                self.message
            );
            ErrorBody {
                error: self.message,
                details: self.details,
            }
        };

        (status, Json(body)).into_response()
    }
}
