//! Logging for Scholar services.
//!
//! Every Scholar crate logs through `tracing` macros. This crate installs the
//! subscriber: JSON lines in production, a pretty multi-line format during
//! development, filtered with an [`EnvFilter`](tracing_subscriber::EnvFilter)
//! directive such as `"info"` or `"scholar_middleware=debug,info"`.
//!
//! # Example
//!
//! ```rust,ignore
//! use scholar_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(user_id = 42, "session resolved");
//! ```

#![warn(missing_docs)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
