//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod bucket;
pub mod messenger;
pub mod reply;

// Re-export commonly used models
pub use bucket::{BucketHandle, ContentRecord, EncryptedRecord, RecordId};
pub use messenger::{EventKind, InboundEvent, WebhookPayload, MessagingItem};
pub use reply::Reply;
