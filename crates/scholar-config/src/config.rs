//! Main configuration types.
//!
//! This module provides the top-level [`ScholarConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{
    CompressionConfig, ConfigError, LogFormat, LoggingConfig, ServerConfig, SessionConfig,
    StaticFilesConfig, MIN_SESSION_SECRET_LEN,
};

/// Complete Scholar service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use scholar_config::ScholarConfig;
///
/// let config = ScholarConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.compression.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ScholarConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Cookie session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Response compression configuration.
    #[serde(default)]
    pub compression: CompressionConfig,

    /// Static file configuration.
    #[serde(default)]
    pub static_files: StaticFilesConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScholarConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ScholarConfigBuilder {
        ScholarConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The server address is not a socket address
    /// - The session secret is set but shorter than 64 bytes
    /// - The session cookie name is empty
    /// - The gzip level is above 9
    /// - The static mount does not start and end with `/`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if let Some(secret) = &self.session.secret {
            if secret.len() < MIN_SESSION_SECRET_LEN {
                return Err(ConfigError::invalid_value(
                    "session.secret",
                    format!(
                        "must be at least {MIN_SESSION_SECRET_LEN} bytes, got {}",
                        secret.len()
                    ),
                ));
            }
        }

        if self.session.cookie_name.is_empty() {
            return Err(ConfigError::invalid_value(
                "session.cookie_name",
                "must not be empty",
            ));
        }

        if self.compression.level > 9 {
            return Err(ConfigError::invalid_value(
                "compression.level",
                "must be between 0 and 9",
            ));
        }

        if self.static_files.enabled {
            let mount = &self.static_files.mount;
            if !mount.starts_with('/') || !mount.ends_with('/') {
                return Err(ConfigError::invalid_value(
                    "static_files.mount",
                    format!("must start and end with '/': {mount}"),
                ));
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty debug-level logs and a local bind address.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs and `Secure` session cookies.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.session.secure = true;
        config
    }
}

/// Builder for [`ScholarConfig`].
#[derive(Debug, Default)]
pub struct ScholarConfigBuilder {
    server: Option<ServerConfig>,
    session: Option<SessionConfig>,
    compression: Option<CompressionConfig>,
    static_files: Option<StaticFilesConfig>,
    logging: Option<LoggingConfig>,
}

impl ScholarConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the session configuration.
    #[must_use]
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the compression configuration.
    #[must_use]
    pub fn compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Set the static file configuration.
    #[must_use]
    pub fn static_files(mut self, static_files: StaticFilesConfig) -> Self {
        self.static_files = Some(static_files);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> ScholarConfig {
        ScholarConfig {
            server: self.server.unwrap_or_default(),
            session: self.session.unwrap_or_default(),
            compression: self.compression.unwrap_or_default(),
            static_files: self.static_files.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<ScholarConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
