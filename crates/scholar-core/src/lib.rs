//! # Scholar Core
//!
//! Core types shared by every stage of the Scholar request pipeline.
//!
//! - [`RequestContext`] - Immutable, append-only per-request context
//! - [`RequestId`] - UUID v7 request identifier
//! - [`SessionData`] - Claims of the authenticated principal
//! - [`Role`] and [`RoleRegistry`] - Role tags and the role → predicate table
//! - [`RouteDescriptor`] - Static per-route metadata (required roles)
//! - [`SessionStore`] and [`Session`] - Boundary to the cookie session backend
//! - [`ScholarError`] - Standard error type

#![doc(html_root_url = "https://docs.rs/scholar-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod role;
mod route;
mod session;
pub mod session_store;

pub use context::{RequestContext, RequestId};
pub use error::{ErrorCategory, ScholarError, ScholarResult};
pub use role::{Role, RoleParseError, RolePredicate, RoleRegistry};
pub use route::RouteDescriptor;
pub use session::SessionData;
pub use session_store::{
    Session, SessionError, SessionStore, SESSION_COOKIE_NAME, SESSION_DATA_KEY,
};
