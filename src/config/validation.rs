//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::services::crypto::PayloadCipher;
use crate::utils::errors::{QuickyError, Result};
use super::{Settings, StorageBackend};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_messenger_config(&settings.messenger)?;
    validate_storage_config(&settings.storage)?;
    if settings.storage.backend == StorageBackend::Postgres {
        validate_database_config(&settings.database)?;
    }
    validate_timeout_config(&settings.timeouts)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(QuickyError::Config("Server host is required".to_string()));
    }

    if config.port == 0 {
        return Err(QuickyError::Config("Server port must be greater than 0".to_string()));
    }

    Ok(())
}

/// Validate Messenger configuration
fn validate_messenger_config(config: &super::MessengerConfig) -> Result<()> {
    if config.access_token.is_empty() {
        return Err(QuickyError::Config("Page access token is required".to_string()));
    }

    if config.verify_token.is_empty() {
        return Err(QuickyError::Config("Webhook verify token is required".to_string()));
    }

    url::Url::parse(&config.graph_api_url)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(QuickyError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(QuickyError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(QuickyError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.encryption_key.is_empty() {
        return Err(QuickyError::Config("Encryption key is required".to_string()));
    }

    PayloadCipher::from_base64(&config.encryption_key)?;

    Ok(())
}

/// Validate timeout configuration
fn validate_timeout_config(config: &super::TimeoutConfig) -> Result<()> {
    if config.storage_ms == 0 || config.reply_ms == 0 {
        return Err(QuickyError::Config("Timeouts must be greater than 0".to_string()));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(QuickyError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(QuickyError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if config.directory.is_empty() || config.file_name.is_empty() {
        return Err(QuickyError::Config("Log directory and file name are required".to_string()));
    }

    Ok(())
}
