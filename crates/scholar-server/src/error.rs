//! Server error types.

use scholar_session::KeyError;
use std::io;
use thiserror::Error;

/// Errors raised while assembling or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid listen address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// Binding the listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address.
        addr: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Two endpoints were registered for the same method and pattern.
    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute {
        /// HTTP method.
        method: http::Method,
        /// Path pattern.
        pattern: String,
    },

    /// The session signing key could not be derived.
    #[error("session key: {0}")]
    SessionKey(#[from] KeyError),

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
