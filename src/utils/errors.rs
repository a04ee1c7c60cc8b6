//! Error handling for QuickyMessenger
//!
//! This module defines the main error type used throughout the application
//! and maps every failure onto the small taxonomy the conversation layer
//! recovers from.

use thiserror::Error;

/// Main error type for QuickyMessenger
#[derive(Error, Debug)]
pub enum QuickyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Selection out of range: {index} (available: {available})")]
    SelectionOutOfRange { index: usize, available: usize },

    #[error("Storage not found: {bucket_name} (user {user_id})")]
    BucketNotFound { user_id: String, bucket_name: String },

    #[error("Storage already exists: {bucket_name}")]
    DuplicateBucket { bucket_name: String },

    #[error("No session for user {user_id}")]
    SessionNotFound { user_id: String },

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Storage operation timed out: {operation}")]
    StorageTimeout { operation: &'static str },

    #[error("Event queue closed")]
    QueueClosed,

    #[error("Reply delivery timed out")]
    ReplyTimeout,

    #[error("Messenger API error (status {status}): {body}")]
    MessengerApi { status: u16, body: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for QuickyMessenger operations
pub type Result<T> = std::result::Result<T, QuickyError>;

/// Failure classes the event handler recovers from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unparseable or incomplete input; dropped without a reply
    MalformedEvent,
    /// Bad wire index; the user is corrected and reset to the action menu
    SelectionOutOfRange,
    /// Repository call failed; generic notice, state preserved
    StorageFailure,
    /// Outbound send failed; logged only
    ReplyDeliveryFailure,
    /// Stored payload could not be decrypted; surfaced as a storage failure
    DecryptionFailure,
    /// Startup misconfiguration
    Configuration,
}

impl QuickyError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuickyError::MalformedEvent(_) => ErrorKind::MalformedEvent,
            QuickyError::SelectionOutOfRange { .. } => ErrorKind::SelectionOutOfRange,
            QuickyError::Decryption(_) => ErrorKind::DecryptionFailure,
            QuickyError::Database(_)
            | QuickyError::BucketNotFound { .. }
            | QuickyError::DuplicateBucket { .. }
            | QuickyError::SessionNotFound { .. }
            | QuickyError::Encryption(_)
            | QuickyError::StorageTimeout { .. }
            | QuickyError::QueueClosed
            | QuickyError::Io(_) => ErrorKind::StorageFailure,
            QuickyError::ReplyTimeout
            | QuickyError::MessengerApi { .. }
            | QuickyError::Http(_)
            | QuickyError::Serialization(_) => ErrorKind::ReplyDeliveryFailure,
            QuickyError::Migration(_)
            | QuickyError::UrlParse(_)
            | QuickyError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            QuickyError::Database(_) => true,
            QuickyError::Migration(_) => false,
            QuickyError::MalformedEvent(_) => true,
            QuickyError::SelectionOutOfRange { .. } => true,
            QuickyError::BucketNotFound { .. } => true,
            QuickyError::DuplicateBucket { .. } => true,
            QuickyError::SessionNotFound { .. } => true,
            QuickyError::Encryption(_) => false,
            QuickyError::Decryption(_) => false,
            QuickyError::StorageTimeout { .. } => true,
            QuickyError::QueueClosed => false,
            QuickyError::ReplyTimeout => true,
            QuickyError::MessengerApi { .. } => true,
            QuickyError::Http(_) => true,
            QuickyError::Serialization(_) => false,
            QuickyError::Io(_) => true,
            QuickyError::UrlParse(_) => false,
            QuickyError::Config(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::MalformedEvent => ErrorSeverity::Info,
            ErrorKind::SelectionOutOfRange => ErrorSeverity::Info,
            ErrorKind::ReplyDeliveryFailure => ErrorSeverity::Warning,
            ErrorKind::StorageFailure => ErrorSeverity::Error,
            ErrorKind::DecryptionFailure => ErrorSeverity::Critical,
            ErrorKind::Configuration => ErrorSeverity::Critical,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::MalformedEvent => "malformed_event",
            ErrorKind::SelectionOutOfRange => "selection_out_of_range",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::ReplyDeliveryFailure => "reply_delivery_failure",
            ErrorKind::DecryptionFailure => "decryption_failure",
            ErrorKind::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
