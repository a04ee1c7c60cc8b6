//! QuickyMessenger
//!
//! A webhook-driven Messenger backend that keeps short encrypted notes in
//! named storages. This library provides the per-user conversation state
//! machine, its concurrent session store, the content repositories and the
//! Messenger transport around them.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{QuickyError, ErrorKind, Result};

// Re-export main components for easy access
pub use database::{ContentRepository, InMemoryContentRepository, PgContentRepository};
pub use handlers::{ConversationHandler, HandleOutcome};
pub use services::{MessengerClient, PayloadCipher, ReplySink};
pub use state::{ConversationState, SessionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
