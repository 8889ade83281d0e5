//! Boundary between the pipeline and the session backend.
//!
//! The authentication stage only needs one capability from a session
//! backend: given the request headers and a cookie name, produce the decoded
//! [`Session`] or say why it could not. Everything else (signing, encoding,
//! expiry, issuing cookies) lives with the backend.

use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use thiserror::Error;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "scholar_session";

/// Key under which [`SessionData`](crate::SessionData) is stored in a session.
pub const SESSION_DATA_KEY: &str = "data";

/// Reasons a session could not be resolved.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The request carries no session cookie.
    #[error("no session cookie present")]
    Missing,

    /// The cookie value could not be decoded.
    #[error("malformed session cookie: {0}")]
    Malformed(String),

    /// The cookie signature did not verify.
    #[error("session cookie signature is invalid")]
    InvalidSignature,

    /// The session is past its expiry time.
    #[error("session expired")]
    Expired,

    /// The session could not be encoded into a cookie.
    #[error("failed to encode session: {0}")]
    Encode(String),
}

/// A decoded session: a named bag of JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    name: String,
    values: serde_json::Map<String, serde_json::Value>,
    is_new: bool,
}

impl Session {
    /// Creates a new, empty session that has not been sent to a client yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: serde_json::Map::new(),
            is_new: true,
        }
    }

    /// Rebuilds a session decoded from a client cookie.
    #[must_use]
    pub fn from_values(
        name: impl Into<String>,
        values: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            name: name.into(),
            values,
            is_new: false,
        }
    }

    /// Cookie name of the session.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the session was created in this request.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }

    /// Raw values of the session.
    #[must_use]
    pub const fn values(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.values
    }

    /// Returns the raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Returns the value stored under `key` decoded as `T`.
    ///
    /// Returns `None` if the key is absent or the value has a different shape.
    #[must_use]
    pub fn typed_record<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(key, error = %e, "session record has unexpected shape");
                None
            }
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value).map_err(|e| SessionError::Encode(e.to_string()))?;
        self.values.insert(key.into(), value);
        Ok(())
    }

    /// Removes the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }
}

/// A session backend able to resolve a request's session.
pub trait SessionStore: Send + Sync + Debug {
    /// Resolves the session named `name` from the request headers.
    fn resolve(&self, headers: &HeaderMap, name: &str) -> Result<Session, SessionError>;
}
