//! Storage bucket and content record models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database identifier of a stored content record
pub type RecordId = i64;

/// Durable bucket row, identified by (user_id, bucket_name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BucketHandle {
    pub id: i64,
    pub user_id: String,
    pub bucket_name: String,
    pub created_at: DateTime<Utc>,
}

/// Decrypted content record as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: RecordId,
    pub recorded_at: DateTime<Utc>,
    pub payload: String,
}

/// Record row as stored, payload still sealed
#[derive(Debug, Clone, FromRow)]
pub struct EncryptedRecord {
    pub id: RecordId,
    pub bucket_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub payload: String,
}
