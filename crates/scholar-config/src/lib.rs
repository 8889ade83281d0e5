//! Typed configuration for Scholar services.
//!
//! Configuration is layered: defaults, then a TOML or JSON file, then
//! `SCHOLAR__SECTION__KEY` environment variables. Unknown fields in files are
//! rejected.
//!
//! - [`ServerConfig`] - bind address, shutdown timeout
//! - [`SessionConfig`] - session cookie name, signing secret, attributes
//! - [`CompressionConfig`] - gzip on/off and level
//! - [`StaticFilesConfig`] - static file mount
//! - [`LoggingConfig`] - log level and format
//!
//! # Example
//!
//! ```no_run
//! use scholar_config::ConfigLoader;
//!
//! # fn main() -> Result<(), scholar_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()
//!     .with_file("scholar.toml")?
//!     .with_env_prefix("SCHOLAR")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//!
//! [session]
//! cookie_name = "scholar_session"
//! max_age_secs = 2592000
//! secure = true
//!
//! [compression]
//! enabled = true
//! level = 6
//!
//! [static_files]
//! enabled = true
//! mount = "/static/"
//! root = "public"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{ScholarConfig, ScholarConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    CompressionConfig, LogFormat, LoggingConfig, ServerConfig, SessionConfig, StaticFilesConfig,
    MIN_SESSION_SECRET_LEN,
};
