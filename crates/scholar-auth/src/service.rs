//! User records and the authentication service.

use crate::error::AuthError;
use crate::password::{sanitize_username, verify_credentials};
use scholar_core::SessionData;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Account status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum UserStatus {
    /// The user may sign in.
    #[default]
    Enabled = 0,
    /// The user may not sign in.
    Disabled = 1,
}

/// A stored user account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Identity key.
    pub id: i64,
    /// Login name, stored sanitized.
    pub username: String,
    /// Email address used to sign in.
    pub email: String,
    /// bcrypt hash of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Account status.
    pub status: UserStatus,
    /// Administrator flag.
    pub is_admin: bool,
    /// Teacher flag.
    pub is_teacher: bool,
}

impl UserRecord {
    /// The session claims for this user.
    #[must_use]
    pub fn session_data(&self) -> SessionData {
        SessionData {
            user_id: self.id,
            username: self.username.clone(),
            is_admin: self.is_admin,
            is_teacher: self.is_teacher,
        }
    }

    /// Returns true if the account may sign in.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status == UserStatus::Enabled
    }
}

impl From<&UserRecord> for SessionData {
    fn from(user: &UserRecord) -> Self {
        user.session_data()
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("status", &self.status)
            .field("is_admin", &self.is_admin)
            .field("is_teacher", &self.is_teacher)
            .finish_non_exhaustive()
    }
}

/// Lookup of stored user accounts.
///
/// Implemented by the persistence layer. Both lookups return `Ok(None)` for
/// an unknown user.
pub trait UserDirectory: Send + Sync {
    /// Finds a user by email address.
    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<UserRecord>, AuthError>>;

    /// Finds a user by login name. The name is sanitized before the lookup.
    fn find_by_username<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AuthError>>;
}

/// A fixed, in-memory [`UserDirectory`].
///
/// # Example
///
/// ```
/// use scholar_auth::{MemoryDirectory, UserRecord, UserStatus};
///
/// let directory = MemoryDirectory::new().with_user(UserRecord {
///     id: 1,
///     username: "ada".into(),
///     email: "ada@school.test".into(),
///     password_hash: String::new(),
///     first_name: "Ada".into(),
///     last_name: "Lovelace".into(),
///     status: UserStatus::Enabled,
///     is_admin: true,
///     is_teacher: false,
/// });
/// assert_eq!(directory.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    by_email: HashMap<String, UserRecord>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user, sanitizing its username. Replaces a user with the same email.
    #[must_use]
    pub fn with_user(mut self, mut user: UserRecord) -> Self {
        user.username = sanitize_username(&user.username);
        self.by_email.insert(user.email.clone(), user);
        self
    }

    /// Number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    /// Returns true if the directory holds no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

impl UserDirectory for MemoryDirectory {
    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<UserRecord>, AuthError>> {
        Box::pin(future::ready(Ok(self.by_email.get(email).cloned())))
    }

    fn find_by_username<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, AuthError>> {
        let username = sanitize_username(username);
        let found = self
            .by_email
            .values()
            .find(|user| user.username == username)
            .cloned();
        Box::pin(future::ready(Ok(found)))
    }
}

/// Password sign-in by email address or login name.
#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

impl AuthService {
    /// Creates a service over `directory`.
    pub fn new(directory: impl UserDirectory + 'static) -> Self {
        Self::shared(Arc::new(directory))
    }

    /// Creates a service over a shared directory.
    #[must_use]
    pub fn shared(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Checks a login and password.
    ///
    /// A login containing `@` is looked up as an email address, anything else
    /// as a login name. Returns the user when the account exists, is enabled
    /// and the password matches. Any of those failing yields `Ok(None)`; the
    /// reason is only logged. Password verification runs on the blocking
    /// thread pool.
    pub async fn basic_auth(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        let login = login.trim();
        let found = if login.contains('@') {
            self.directory.find_by_email(login).await?
        } else {
            self.directory.find_by_username(login).await?
        };
        let Some(user) = found else {
            tracing::debug!("sign-in for unknown user");
            return Ok(None);
        };

        if !user.is_enabled() {
            tracing::info!(user.id = user.id, "sign-in refused for disabled user");
            return Ok(None);
        }

        let stored = user.password_hash.clone();
        let candidate = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || verify_credentials(&stored, &candidate))
            .await
            .map_err(|e| AuthError::Task(e.to_string()))?;

        if !matches {
            tracing::info!(user.id = user.id, "sign-in refused: wrong password");
            return Ok(None);
        }

        tracing::debug!(user.id = user.id, "user signed in");
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::hash_password;

    fn user(id: i64, email: &str, password: &str, status: UserStatus) -> UserRecord {
        UserRecord {
            id,
            username: format!(" User{id} "),
            email: email.to_string(),
            password_hash: hash_password(password, 4).unwrap(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            status,
            is_admin: false,
            is_teacher: true,
        }
    }

    fn service() -> AuthService {
        AuthService::new(
            MemoryDirectory::new()
                .with_user(user(1, "t@school.test", "apple", UserStatus::Enabled))
                .with_user(user(2, "gone@school.test", "pear", UserStatus::Disabled)),
        )
    }

    #[tokio::test]
    async fn test_basic_auth_success() {
        let found = service()
            .basic_auth("t@school.test", "apple")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(found.username, "user1");
    }

    #[tokio::test]
    async fn test_email_is_trimmed() {
        let found = service().basic_auth("  t@school.test ", "apple").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_basic_auth_by_username() {
        let found = service().basic_auth(" USER1", "apple").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(1));

        assert!(service()
            .basic_auth("user1", "banana")
            .await
            .unwrap()
            .is_none());
        assert!(service()
            .basic_auth("user2", "pear")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_wrong_password() {
        assert!(service()
            .basic_auth("t@school.test", "banana")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        assert!(service()
            .basic_auth("nobody@school.test", "apple")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_disabled_user() {
        assert!(service()
            .basic_auth("gone@school.test", "pear")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_directory_error_propagates() {
        struct Broken;

        impl UserDirectory for Broken {
            fn find_by_email<'a>(
                &'a self,
                _email: &'a str,
            ) -> BoxFuture<'a, Result<Option<UserRecord>, AuthError>> {
                Box::pin(async { Err(AuthError::directory("database unavailable")) })
            }

            fn find_by_username<'a>(
                &'a self,
                _username: &'a str,
            ) -> BoxFuture<'a, Result<Option<UserRecord>, AuthError>> {
                Box::pin(async { Err(AuthError::directory("database unavailable")) })
            }
        }

        let service = AuthService::new(Broken);
        let result = service.basic_auth("a@b.c", "x").await;
        assert!(matches!(result, Err(AuthError::Directory(_))));
        let result = service.basic_auth("ab", "x").await;
        assert!(matches!(result, Err(AuthError::Directory(_))));
    }

    #[tokio::test]
    async fn test_find_by_username_sanitizes() {
        let directory =
            MemoryDirectory::new().with_user(user(5, "x@school.test", "pw", UserStatus::Enabled));
        let found = directory.find_by_username("  USER5").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(5));
    }

    #[test]
    fn test_session_data_from_user() {
        let mut record = user(3, "a@school.test", "pw", UserStatus::Enabled);
        record.is_admin = true;
        let data = SessionData::from(&record);
        assert_eq!(data.user_id, 3);
        assert!(data.is_admin);
        assert!(data.is_teacher);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let record = user(4, "b@school.test", "pw", UserStatus::Enabled);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!format!("{record:?}").contains("$2"));
    }
}
