//! Error type system for the library API
//!
//! This module provides:
//! - A single error enum covering store, request and access failures
//! - HTTP status code mapping
//! - Field-level validation errors rendered as `{field: [messages]}`
//! - Trace IDs on every non-field error body

use crate::core::validation::FieldErrors;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Main error type for the library API
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation failed: {0}")]
    ValidationError(FieldErrors),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task error: {0}")]
    TaskError(String),
}

impl LibraryError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            LibraryError::InvalidRequest(_) | LibraryError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            LibraryError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
            LibraryError::ConfigError(_)
            | LibraryError::DatabaseError(_)
            | LibraryError::PoolError(_)
            | LibraryError::IoError(_)
            | LibraryError::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            LibraryError::ConfigError(_) => "ConfigError",
            LibraryError::DatabaseError(_) => "DatabaseError",
            LibraryError::PoolError(_) => "PoolError",
            LibraryError::InvalidRequest(_) => "InvalidRequest",
            LibraryError::ValidationError(_) => "ValidationError",
            LibraryError::AuthenticationError(_) => "AuthenticationError",
            LibraryError::NotFound(_) => "NotFound",
            LibraryError::IoError(_) => "IoError",
            LibraryError::TaskError(_) => "TaskError",
        }
    }

    /// Shorthand for a validation error on a single field
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        LibraryError::ValidationError(errors)
    }
}

tokio::task_local! {
    /// Trace ID of the request being handled, scoped by the trace middleware
    pub static REQUEST_TRACE_ID: String;
}

/// Error response structure for non-field errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response carrying the current request's trace ID,
    /// or a fresh one outside a request
    pub fn new(error: String, message: String) -> Self {
        let trace_id = REQUEST_TRACE_ID
            .try_with(|id| id.clone())
            .unwrap_or_else(|_| Uuid::new_v4().to_string());

        Self {
            error,
            message,
            trace_id,
        }
    }

    /// Create an error response from a LibraryError
    pub fn from_error(error: &LibraryError) -> Self {
        Self::new(error.error_type().to_string(), error.to_string())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (trace_id: {})", self.error, self.message, self.trace_id)
    }
}

impl IntoResponse for LibraryError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // Field errors are part of the contract and are returned as the bare map
        if let LibraryError::ValidationError(errors) = self {
            tracing::warn!(fields = ?errors.fields().collect::<Vec<_>>(), "Request rejected by validation");
            return (status_code, Json(errors)).into_response();
        }

        let error_response = ErrorResponse::from_error(&self);

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with LibraryError
pub type Result<T> = std::result::Result<T, LibraryError>;
