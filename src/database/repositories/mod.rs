//! Content repositories
//!
//! Durable storage of timestamped content records grouped by
//! (user, bucket name). Payloads are encrypted before they are written and
//! decrypted after they are read; a single undecryptable record fails the
//! whole listing.

pub mod content;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::models::{BucketHandle, ContentRecord, RecordId};
use crate::utils::errors::Result;

pub use content::PgContentRepository;
pub use memory::InMemoryContentRepository;

/// Storage contract used by the conversation layer
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Return the bucket row for (user_id, name), creating it if absent
    async fn ensure_bucket(&self, user_id: &str, bucket_name: &str) -> Result<BucketHandle>;

    /// The bucket row for (user_id, name), if it was ever created
    async fn find_bucket(&self, user_id: &str, bucket_name: &str) -> Result<Option<BucketHandle>>;

    /// Encrypt and append one record to a bucket
    async fn append_record(
        &self,
        bucket: &BucketHandle,
        recorded_at: DateTime<Utc>,
        payload: &str,
    ) -> Result<RecordId>;

    /// Decrypted records of a bucket in creation order.
    /// `BucketNotFound` if the bucket was never durably created.
    async fn list_records(&self, user_id: &str, bucket_name: &str) -> Result<Vec<ContentRecord>>;

    /// Every bucket of a user in creation order
    async fn list_buckets(&self, user_id: &str) -> Result<Vec<BucketHandle>>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<()>;
}
