//! # Scholar Middleware
//!
//! Request pipeline for the Scholar backend.
//!
//! A request passes through an ordered list of stages before reaching its
//! handler. Each stage either answers the request itself or calls the next
//! one, possibly with a derived [`RequestContext`](scholar_core::RequestContext)
//! or a decorated [`ResponseWriter`].
//!
//! ## Standard pipeline
//!
//! ```text
//! Request → NoDirectoryListing → ResponseCompressor → AuthenticationGate → AuthorizationGate → Handler
//! ```
//!
//! | Stage | Rejects with | Purpose |
//! |---|---|---|
//! | [`NoDirectoryListing`](stages::NoDirectoryListing) | 404 | No generated directory indexes |
//! | [`ResponseCompressor`](stages::ResponseCompressor) | - | Gzip when accepted, always `Vary: Accept-Encoding` |
//! | [`AuthenticationGate`](stages::AuthenticationGate) | 401 | Resolve the session cookie, bind [`SessionData`](scholar_core::SessionData) |
//! | [`AuthorizationGate`](stages::AuthorizationGate) | 403 | Any one of the route's required roles |
//!
//! ## Example
//!
//! ```
//! use scholar_config::ScholarConfig;
//! use scholar_middleware::Pipeline;
//!
//! let pipeline = Pipeline::standard(&ScholarConfig::default());
//! assert_eq!(pipeline.stage_count(), 4);
//! assert_eq!(pipeline.stage_names()[0], "no_directory_listing");
//! ```

#![doc(html_root_url = "https://docs.rs/scholar-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod endpoint;
mod gzip;
mod handler;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;
mod writer;

pub use endpoint::Endpoint;
pub use gzip::GzipResponseWriter;
pub use handler::{FnHandler, Handler};
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use types::{Request, Response};
pub use writer::{BufferedResponse, ResponseWriter};
