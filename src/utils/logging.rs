//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the QuickyMessenger application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use crate::config::LoggingConfig;
use crate::utils::errors::{QuickyError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_name)
        .max_log_files(config.max_files)
        .build(&config.directory)
        .map_err(|e| QuickyError::Config(format!("Failed to create log file appender: {}", e)))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| QuickyError::Config(format!("Invalid log filter: {}", e)))?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stdout))
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init()
    };
    installed.map_err(|e| QuickyError::Config(format!("Failed to install subscriber: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: &str, action: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log a conversation state change
pub fn log_transition(user_id: &str, from: &str, to: &str) {
    if from == to {
        debug!(user_id = user_id, state = to, "Conversation state unchanged");
    } else {
        info!(user_id = user_id, from = from, to = to, "Conversation state changed");
    }
}

/// Log repository operations
pub fn log_storage_operation(operation: &str, user_id: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            user_id = user_id,
            duration_ms = duration_ms,
            "Storage operation completed"
        );
    } else {
        error!(
            operation = operation,
            user_id = user_id,
            duration_ms = duration_ms,
            "Storage operation failed"
        );
    }
}

/// Log an outbound reply that could not be delivered
pub fn log_reply_failure(user_id: &str, reply_kind: &str, error: &str) {
    warn!(
        user_id = user_id,
        reply = reply_kind,
        error = error,
        "Reply delivery failed"
    );
}
