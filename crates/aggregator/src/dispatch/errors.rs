//! Request-level error taxonomy.
//!
//! Every failure detected while serving a request resolves into exactly one
//! [`ApiError`], which carries the status code and the plain-text message
//! written to the client.

use http::StatusCode;
use thiserror::Error;

use crate::query::QueryError;
use crate::store::StoreError;

use super::response::{ApiResponse, error_response};

/// Errors surfaced while serving a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Malformed query parameters.
    #[error("{message}")]
    Validation { message: String },
    /// Unknown route or missing object.
    #[error("{message}")]
    NotFound { message: String },
    /// Method not served by the route.
    #[error("{message}")]
    MethodNotAllowed { message: String },
    /// Requested resource version has expired.
    #[error("{message}")]
    Gone { message: String },
    /// Body exceeded the configured limit.
    #[error("{message}")]
    PayloadTooLarge { message: String },
    /// Backing, encoding, hook or kind resolution failure.
    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Gone { .. } => StatusCode::GONE,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// The generic not-found answer for unknown routes.
    pub fn no_route() -> Self {
        Self::not_found("404 page not found")
    }

    /// Creates a method-not-allowed error.
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            message: message.into(),
        }
    }

    /// Creates a gone error.
    pub fn gone(message: impl Into<String>) -> Self {
        Self::Gone {
            message: message.into(),
        }
    }

    /// Creates a payload-too-large error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Maps a backing store failure. `action` prefixes non-specific failures,
    /// e.g. `failed to list widgets`.
    pub fn from_store(error: StoreError, action: &str) -> Self {
        match error {
            StoreError::NotFound { .. } => Self::not_found(error.to_string()),
            StoreError::Gone { message } => Self::gone(message),
            StoreError::Other { message } => Self::internal(format!("{action}: {message}")),
        }
    }

    /// Writes the error as a plain-text response.
    pub fn into_response(self) -> ApiResponse {
        error_response(self.status(), &self.to_string())
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        Self::validation(error.to_string())
    }
}
