//! Error types for authentication.

use scholar_core::ScholarError;
use thiserror::Error;

/// Errors raised while authenticating users or managing credentials.
///
/// A wrong password or an unknown user is not an error; those are reported
/// as `Ok(None)` by [`AuthService::basic_auth`](crate::AuthService::basic_auth).
#[derive(Debug, Error)]
pub enum AuthError {
    /// Hashing a password failed.
    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    /// The user directory could not be queried.
    #[error("user directory error: {0}")]
    Directory(String),

    /// A blocking hashing task panicked or was cancelled.
    #[error("credential task failed: {0}")]
    Task(String),
}

impl AuthError {
    /// Creates a directory error.
    pub fn directory(message: impl Into<String>) -> Self {
        Self::Directory(message.into())
    }
}

impl From<AuthError> for ScholarError {
    fn from(error: AuthError) -> Self {
        ScholarError::internal_with_source("authentication backend failed", error)
    }
}
