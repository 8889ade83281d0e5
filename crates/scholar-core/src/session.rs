//! Authenticated principal claims.

use serde::{Deserialize, Serialize};

/// Claims of an authenticated principal.
///
/// Built at login time, stored in the session cookie under
/// [`SESSION_DATA_KEY`](crate::SESSION_DATA_KEY) and deserialized fresh on
/// every request by the authentication stage. The pipeline never mutates it.
///
/// # Example
///
/// ```
/// use scholar_core::SessionData;
///
/// let data = SessionData::new(7, "jdoe").teacher();
/// assert!(data.is_teacher);
/// assert!(!data.is_admin);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Identity key of the user.
    pub user_id: i64,

    /// Login name of the user.
    pub username: String,

    /// Whether the user holds the administrator role.
    #[serde(default)]
    pub is_admin: bool,

    /// Whether the user holds the teacher role.
    #[serde(default)]
    pub is_teacher: bool,
}

impl SessionData {
    /// Creates session data with no role flags set.
    #[must_use]
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_admin: false,
            is_teacher: false,
        }
    }

    /// Returns the data with the administrator flag set.
    #[must_use]
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Returns the data with the teacher flag set.
    #[must_use]
    pub fn teacher(mut self) -> Self {
        self.is_teacher = true;
        self
    }
}
