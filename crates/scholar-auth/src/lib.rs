//! # Scholar Auth
//!
//! Credential checks behind the Scholar sign-in flow.
//!
//! - [`verify_credentials`] / [`hash_password`] - bcrypt password hashes
//! - [`UserDirectory`] - lookup of stored accounts, implemented by persistence
//! - [`AuthService`] - password sign-in by email or login name
//!
//! The request pipeline never calls into this crate; it only sees the
//! [`SessionData`](scholar_core::SessionData) a successful sign-in stores in
//! the session cookie.
//!
//! ## Example
//!
//! ```
//! use scholar_auth::{hash_password, AuthService, MemoryDirectory, UserRecord, UserStatus};
//!
//! # tokio_test::block_on(async {
//! let directory = MemoryDirectory::new().with_user(UserRecord {
//!     id: 1,
//!     username: "ada".into(),
//!     email: "ada@school.test".into(),
//!     password_hash: hash_password("analytical", 4).unwrap(),
//!     first_name: "Ada".into(),
//!     last_name: "Lovelace".into(),
//!     status: UserStatus::Enabled,
//!     is_admin: true,
//!     is_teacher: false,
//! });
//! let auth = AuthService::new(directory);
//!
//! let user = auth.basic_auth("ada@school.test", "analytical").await.unwrap();
//! assert!(user.unwrap().session_data().is_admin);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/scholar-auth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod password;
mod service;

pub use error::AuthError;
pub use password::{hash_password, sanitize_username, verify_credentials, DEFAULT_COST};
pub use service::{AuthService, BoxFuture, MemoryDirectory, UserDirectory, UserRecord, UserStatus};
