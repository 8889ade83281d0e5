//! Password hashing and verification.

use crate::error::AuthError;

/// bcrypt cost used for new password hashes.
pub const DEFAULT_COST: u32 = 10;

/// Hashes `password` with bcrypt at `cost`.
///
/// # Example
///
/// ```
/// use scholar_auth::{hash_password, verify_credentials};
///
/// let hash = hash_password("correct horse", 4).unwrap();
/// assert!(verify_credentials(&hash, "correct horse"));
/// ```
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Returns true if `candidate` matches the bcrypt `stored_hash`.
///
/// A malformed hash never matches.
pub fn verify_credentials(stored_hash: &str, candidate: &str) -> bool {
    match bcrypt::verify(candidate, stored_hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not valid bcrypt");
            false
        }
    }
}

/// Normalizes a username: surrounding spaces removed, lowercased.
pub fn sanitize_username(username: &str) -> String {
    username.trim_matches(' ').to_lowercase()
}
