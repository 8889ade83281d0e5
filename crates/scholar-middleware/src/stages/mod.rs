//! Pipeline stages.
//!
//! The four stages of the standard pipeline, outermost first:
//!
//! 1. [`directory_listing`] - Reject directory-style paths with 404
//! 2. [`compression`] - Gzip the response when the client accepts it
//! 3. [`authentication`] - Resolve the session cookie, bind [`SessionData`](scholar_core::SessionData)
//! 4. [`authorization`] - Check the route's required roles against the session
//!
//! Request failures (404, 401, 403) are answered by the stage itself. Only
//! wiring faults, where a stage runs without a binding an earlier stage
//! should have provided, escape as `Err`.

pub mod authentication;
pub mod authorization;
pub mod compression;
pub mod directory_listing;

pub use authentication::AuthenticationGate;
pub use authorization::AuthorizationGate;
pub use compression::ResponseCompressor;
pub use directory_listing::NoDirectoryListing;
