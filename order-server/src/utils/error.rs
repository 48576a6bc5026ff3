//! Unified error handling
//!
//! Application error taxonomy and its HTTP mapping:
//!
//! | Variant | Status | Notes |
//! |---------|--------|-------|
//! | `Validation` | 400 | carries the full list of offending fields/products |
//! | `DuplicateOrderNumber` | 400 | distinct message from field validation |
//! | `NotFound` | 404 | |
//! | `Notification` | 500 | only surfaced on the manual resend path |
//! | `Database` / `Internal` | 500 | detail logged, echoed only in debug builds |
//!
//! Every error body carries a human-readable `message`; validation errors
//! additionally carry an `errors` list.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::db::repository::RepoError;

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    /// Missing/malformed required fields (400)
    Validation {
        message: String,
        errors: Vec<String>,
    },

    #[error("{0}")]
    /// Referenced resource does not exist (404)
    NotFound(String),

    #[error("Order number already exists")]
    /// Order-number collision at write time (400)
    DuplicateOrderNumber,

    #[error("Failed to send email")]
    /// Confirmation send failed on the manual resend path (500)
    Notification,

    #[error("Database error: {0}")]
    /// Persistence failure (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// Anything else (500)
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(_) => AppError::DuplicateOrderNumber,
            RepoError::Storage(msg) => AppError::Database(msg),
        }
    }
}

/// Error response body
///
/// ```json
/// { "message": "...", "errors": ["fullName", "phone"] }
/// ```
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation { message, errors } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message,
                    errors,
                    error: None,
                },
            ),
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    message,
                    errors: Vec::new(),
                    error: None,
                },
            ),
            AppError::DuplicateOrderNumber => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: "Order number already exists".to_string(),
                    errors: Vec::new(),
                    error: None,
                },
            ),
            AppError::Notification => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    message: "Failed to send email".to_string(),
                    errors: Vec::new(),
                    error: None,
                },
            ),
            AppError::Database(detail) => {
                error!(target: "database", error = %detail, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: "Database error".to_string(),
                        errors: Vec::new(),
                        error: debug_detail(detail),
                    },
                )
            }
            AppError::Internal(detail) => {
                error!(target: "internal", error = %detail, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: "Internal server error".to_string(),
                        errors: Vec::new(),
                        error: debug_detail(detail),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Internal detail is only echoed to clients in debug builds
fn debug_detail(detail: String) -> Option<String> {
    if cfg!(debug_assertions) {
        Some(detail)
    } else {
        None
    }
}
