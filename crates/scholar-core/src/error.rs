//! Error types for Scholar.
//!
//! [`ScholarError`] separates two very different kinds of failure:
//!
//! - **Request failures** (authentication, authorization, not found, ...) that
//!   map to a user-facing status code.
//! - **Wiring faults**: a stage ran without a context binding that an earlier
//!   stage should have provided. These indicate a misassembled pipeline and
//!   are reported as internal errors, never as 401/403.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`ScholarError`].
pub type ScholarResult<T> = Result<T, ScholarError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid input.
    Validation,
    /// Missing, invalid or expired session.
    Authentication,
    /// Authenticated but not permitted.
    Authorization,
    /// Resource not found.
    NotFound,
    /// Conflict (e.g., duplicate username).
    Conflict,
    /// Internal server errors, including wiring faults.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Scholar.
///
/// # Example
///
/// ```
/// use scholar_core::{ErrorCategory, ScholarError};
///
/// let err = ScholarError::wiring("authorization", "route");
/// assert!(err.is_wiring());
/// assert_eq!(err.category(), ErrorCategory::Internal);
/// ```
#[derive(Error, Debug)]
pub enum ScholarError {
    /// A stage ran without a binding an earlier stage must provide.
    #[error("pipeline wiring fault: stage '{stage}' requires '{binding}' in the request context")]
    Wiring {
        /// The stage that detected the fault.
        stage: &'static str,
        /// The missing context binding.
        binding: &'static str,
    },

    /// Authentication failed.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Authorization denied.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Request validation failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
    },

    /// Conflict error.
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message.
        message: String,
    },

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// I/O error while writing the response.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScholarError {
    /// Creates a wiring fault for `stage` missing `binding`.
    #[must_use]
    pub const fn wiring(stage: &'static str, binding: &'static str) -> Self {
        Self::Wiring { stage, binding }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns true if this error is a pipeline wiring fault.
    #[must_use]
    pub const fn is_wiring(&self) -> bool {
        matches!(self, Self::Wiring { .. })
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Wiring { .. } | Self::Internal { .. } | Self::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wiring_is_internal() {
        let error = ScholarError::wiring("authentication", "cookie_store");
        assert!(error.is_wiring());
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.to_string().contains("authentication"));
        assert!(error.to_string().contains("cookie_store"));
    }

    #[test]
    fn test_request_failures_are_not_wiring() {
        assert!(!ScholarError::authentication("no session").is_wiring());
        assert!(!ScholarError::authorization("no role").is_wiring());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ScholarError::authentication("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ScholarError::authorization("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ScholarError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ScholarError::conflict("x").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ScholarError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "client went away");
        let error: ScholarError = io.into();
        assert_eq!(error.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_internal_with_source() {
        let error = ScholarError::internal_with_source("db down", anyhow::anyhow!("timeout"));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&ErrorCategory::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
    }
}
