//! Error handling with structured error types and HTTP mappings
//!
//! Validation failures are detected before any external call; upstream
//! failures are converted to error responses at the handler boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON error body returned to API clients.
///
/// Shapes match the public contract: validation errors carry only `error`,
/// upstream failures add `details`, and the 404 fallback adds `message`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application error types with proper categorization
#[derive(Debug)]
pub enum AppError {
    // Validation errors (400)
    InvalidInput { field: String, reason: String },

    // Not found (404)
    TodoNotFound(String),
    RouteNotFound { method: String, path: String },

    // Upstream service failures (500)
    ExternalService { service: String, reason: String },

    // Persistence failures (500)
    Storage(String),

    // Generic wrapper for external errors
    Internal(anyhow::Error),
}

impl AppError {
    /// Machine-readable error code for logs and tests
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::TodoNotFound(_) => "TODO_NOT_FOUND",
            Self::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::TodoNotFound(_) | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ExternalService { .. } | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason } => {
                format!("Invalid input for field '{field}': {reason}")
            }
            Self::TodoNotFound(id) => format!("Todo not found: {id}"),
            Self::RouteNotFound { method, path } => format!("Cannot {method} {path}"),
            Self::ExternalService { service, reason } => {
                format!("{service} call failed: {reason}")
            }
            Self::Storage(msg) => format!("Storage error: {msg}"),
            Self::Internal(err) => format!("Internal error: {err}"),
        }
    }

    /// Convert to the JSON body clients see
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            Self::InvalidInput { reason, .. } => ErrorResponse {
                error: reason.clone(),
                message: None,
                details: None,
            },
            Self::TodoNotFound(id) => ErrorResponse {
                error: "Not Found".to_string(),
                message: Some(format!("Todo not found: {id}")),
                details: None,
            },
            Self::RouteNotFound { method, path } => ErrorResponse {
                error: "Not Found".to_string(),
                message: Some(format!("Cannot {method} {path}")),
                details: None,
            },
            Self::ExternalService { reason, .. } => ErrorResponse {
                error: "An error occurred while processing your request".to_string(),
                message: None,
                details: Some(reason.clone()),
            },
            Self::Storage(msg) => ErrorResponse {
                error: "Internal Server Error".to_string(),
                message: None,
                details: Some(msg.clone()),
            },
            Self::Internal(err) => ErrorResponse {
                error: "Internal Server Error".to_string(),
                message: None,
                details: Some(err.to_string()),
            },
        }
    }

    /// Shorthand for a missing/invalid request field
    pub fn invalid_input(field: &str, reason: &str) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for an upstream service failure
    pub fn external(service: &str, reason: impl fmt::Display) -> Self {
        Self::ExternalService {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        (status, Json(body)).into_response()
    }
}

/// Helper trait to convert validation errors
pub trait ValidationErrorExt<T> {
    fn map_validation_err(self, field: &str) -> Result<T>;
}

impl<T> ValidationErrorExt<T> for anyhow::Result<T> {
    fn map_validation_err(self, field: &str) -> Result<T> {
        self.map_err(|e| AppError::InvalidInput {
            field: field.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;
