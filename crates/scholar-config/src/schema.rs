//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use scholar_core::SESSION_COOKIE_NAME;
use scholar_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Minimum length of the session signing secret, in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

/// HTTP server configuration section.
///
/// # Example
///
/// ```
/// use scholar_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert!(config.keep_alive);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Enable HTTP/1 keep-alive.
    #[serde(default = "default_true")]
    pub keep_alive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            keep_alive: true,
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Cookie session configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Signing secret. At least 64 bytes. Usually supplied through
    /// `SCHOLAR__SESSION__SECRET` rather than a checked-in file.
    #[serde(default)]
    pub secret: Option<String>,

    /// Cookie `Path` attribute.
    #[serde(default = "default_cookie_path")]
    pub path: String,

    /// Session lifetime in seconds.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,

    /// Set the `Secure` attribute.
    #[serde(default)]
    pub secure: bool,

    /// Set the `HttpOnly` attribute.
    #[serde(default = "default_true")]
    pub http_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secret: None,
            path: default_cookie_path(),
            max_age_secs: default_max_age(),
            secure: false,
            http_only: true,
        }
    }
}

fn default_cookie_name() -> String {
    SESSION_COOKIE_NAME.to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_max_age() -> u64 {
    86_400 * 30
}

/// Response compression configuration section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CompressionConfig {
    /// Enable gzip compression of responses.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Gzip level, 0 (store) to 9 (best).
    #[serde(default = "default_gzip_level")]
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_gzip_level(),
        }
    }
}

fn default_gzip_level() -> u32 {
    6
}

/// Static file serving configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StaticFilesConfig {
    /// Serve static files.
    #[serde(default)]
    pub enabled: bool,

    /// URL prefix the files are mounted under.
    #[serde(default = "default_mount")]
    pub mount: String,

    /// Directory holding the files.
    #[serde(default = "default_root")]
    pub root: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mount: default_mount(),
            root: default_root(),
        }
    }
}

fn default_mount() -> String {
    "/static/".to_string()
}

fn default_root() -> String {
    "public".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Service name recorded in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
            service_name: default_service_name(),
        }
    }
}

impl LoggingConfig {
    /// Converts the section into the logging subscriber settings.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: false,
            file_line_info: self.include_location,
            include_target: true,
            service_name: self.service_name.clone(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "scholar".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, SESSION_COOKIE_NAME);
        assert_eq!(config.path, "/");
        assert_eq!(config.max_age_secs, 2_592_000);
        assert!(!config.secure);
        assert!(config.http_only);
        assert!(config.secret.is_none());
    }

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
    }

    #[test]
    fn test_to_log_config() {
        let section = LoggingConfig {
            format: LogFormat::Pretty,
            include_location: true,
            ..Default::default()
        };
        let log = section.to_log_config();
        assert!(!log.json_format);
        assert!(log.file_line_info);
        assert_eq!(log.service_name, "scholar");
    }

    #[test]
    fn test_compression_defaults() {
        let config = CompressionConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, 6);
    }
}
