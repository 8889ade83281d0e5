//! Signed cookie sessions for Scholar.
//!
//! The whole session lives in the cookie: a JSON envelope of values plus an
//! expiry timestamp, base64url encoded and signed with HMAC-SHA256 by the
//! `cookie` crate. Nothing is stored server side, so any instance holding the
//! same key can resolve any session.
//!
//! [`CookieSessionStore`] implements [`SessionStore`](scholar_core::SessionStore)
//! for the authentication stage, and issues and clears cookies for the
//! login and logout handlers.

#![warn(missing_docs)]

mod store;

pub use store::{CookieSessionStore, KeyError, SessionOptions};
