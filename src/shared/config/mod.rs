//! Application configuration module
//!
//! `AppConfig` holds every tunable of the server: bind address, optional
//! database, token verification and real-time transport limits. It can be
//! assembled with the builder, deserialized from TOML, or left at defaults
//! for local development.
//!
//! ```rust
//! use huddle::shared::AppConfig;
//!
//! let config = AppConfig::from_toml_str(r#"
//!     [server]
//!     port = 4000
//!
//!     [realtime]
//!     heartbeat_timeout_secs = 30
//! "#).unwrap();
//! assert_eq!(config.server.port, 4000);
//! assert_eq!(config.realtime.heartbeat_interval_secs, 25);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::shared::messaging::Role;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub realtime: RealtimeSettings,
    /// Principals created at startup when running without a database
    #[serde(rename = "principals")]
    pub seed_principals: Vec<SeedPrincipal>,
}

/// Bind address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// PostgreSQL connection; absent means the in-memory store is used
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
}

/// Token verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    /// Reject WebSocket upgrades that carry no token
    pub require_token: bool,
    /// Lifetime of issued tokens
    pub token_ttl_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "huddle-dev-secret-change-me".to_string(),
            require_token: false,
            token_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

/// Real-time transport limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSettings {
    /// How often the server pings each connection
    pub heartbeat_interval_secs: u64,
    /// Silence after which a connection is declared dead
    pub heartbeat_timeout_secs: u64,
    /// Per-connection outbound queue length
    pub outbound_capacity: usize,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 25,
            heartbeat_timeout_secs: 60,
            outbound_capacity: 256,
        }
    }
}

impl RealtimeSettings {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }
}

/// A principal to create at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPrincipal {
    #[serde(default)]
    pub id: Option<uuid::Uuid>,
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML document; missing sections take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::MissingValue("server.host"));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("auth.jwt_secret"));
        }
        if self.realtime.outbound_capacity == 0 {
            return Err(ConfigError::Invalid(
                "realtime.outbound_capacity must be at least 1".to_string(),
            ));
        }
        if self.realtime.heartbeat_interval_secs == 0 || self.realtime.heartbeat_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "realtime heartbeat settings must be positive".to_string(),
            ));
        }
        if self.realtime.heartbeat_interval_secs >= self.realtime.heartbeat_timeout_secs {
            return Err(ConfigError::Invalid(
                "realtime.heartbeat_interval_secs must be shorter than heartbeat_timeout_secs"
                    .to_string(),
            ));
        }
        if let Some(url) = &self.database.url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        Ok(())
    }

    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database.url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.auth.jwt_secret = secret.into();
        self
    }

    pub fn require_token(mut self, require: bool) -> Self {
        self.config.auth.require_token = require;
        self
    }

    pub fn heartbeat(mut self, interval_secs: u64, timeout_secs: u64) -> Self {
        self.config.realtime.heartbeat_interval_secs = interval_secs;
        self.config.realtime.heartbeat_timeout_secs = timeout_secs;
        self
    }

    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.config.realtime.outbound_capacity = capacity;
        self
    }

    pub fn seed_principal(mut self, display_name: impl Into<String>, role: Role) -> Self {
        self.config.seed_principals.push(SeedPrincipal {
            id: None,
            display_name: display_name.into(),
            role,
        });
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}
