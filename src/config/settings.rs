//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub messenger: MessengerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub timeouts: TimeoutConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener for the webhook
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Messenger platform configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessengerConfig {
    /// Page access token used for the Send API
    pub access_token: String,
    /// Token expected in the webhook verification handshake
    pub verify_token: String,
    /// Graph API base URL, including the version segment
    pub graph_api_url: String,
    /// Register the Get Started button and persistent menu on startup
    pub setup_profile: bool,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Which content repository backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Content storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Base64-encoded 32-byte key for payload encryption
    pub encryption_key: String,
}

/// Upper bounds for blocking calls made while handling an event
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    pub storage_ms: u64,
    pub reply_ms: u64,
}

impl TimeoutConfig {
    pub fn storage(&self) -> Duration {
        Duration::from_millis(self.storage_ms)
    }

    pub fn reply(&self) -> Duration {
        Duration::from_millis(self.reply_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_name: String,
    pub max_files: usize,
    pub json: bool,
}

impl Settings {
    /// Load settings from defaults, an optional `config.toml` and
    /// `QUICKY_*` environment variables (nested keys joined with `__`)
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("QUICKY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::QuickyError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            messenger: MessengerConfig {
                access_token: String::new(),
                verify_token: String::new(),
                graph_api_url: "https://graph.facebook.com/v19.0".to_string(),
                setup_profile: true,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/quickymessenger".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                encryption_key: String::new(),
            },
            timeouts: TimeoutConfig {
                storage_ms: 5_000,
                reply_ms: 10_000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                file_name: "quickymessenger.log".to_string(),
                max_files: 7,
                json: false,
            },
        }
    }
}
