//! # Scholar Server
//!
//! HTTP host for the Scholar request pipeline.
//!
//! - HTTP/1.1 via hyper, one tokio task per connection
//! - a [`RouteTable`] of method and path patterns, plus prefix mounts
//! - [`StaticFiles`] served behind the public pipeline
//! - sign-in, sign-out and session echo handlers
//! - graceful shutdown through [`ShutdownSignal`]
//!
//! ## Example
//!
//! ```no_run
//! use scholar_auth::{AuthService, MemoryDirectory};
//! use scholar_config::ConfigLoader;
//! use scholar_server::{Server, ShutdownSignal};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_env_prefix("SCHOLAR").load()?;
//!     let server = Server::application(&config, AuthService::new(MemoryDirectory::new()))?;
//!     server.run_with_shutdown(ShutdownSignal::with_os_signals()).await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/scholar-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod handlers;
mod router;
mod server;
mod shutdown;
mod static_files;

pub use error::{ServerError, ServerResult};
pub use handlers::{LoginHandler, LogoutHandler, SessionInfoHandler};
pub use router::{PathParams, RouteLookup, RouteTable};
pub use server::{Server, ServerBuilder};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
pub use static_files::StaticFiles;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
