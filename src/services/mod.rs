//! Services module
//!
//! Outbound delivery to the messaging platform and payload encryption

pub mod crypto;
pub mod messenger;
pub mod templates;

use async_trait::async_trait;
use crate::models::Reply;
use crate::utils::errors::Result;

pub use crypto::PayloadCipher;
pub use messenger::MessengerClient;

/// Destination for structured replies
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, user_id: &str, reply: &Reply) -> Result<()>;
}
