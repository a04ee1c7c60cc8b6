//! In-memory content repository
//!
//! Same contract as the PostgreSQL repository, payloads included: records are
//! kept sealed and opened on read. Used for local runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use crate::models::{BucketHandle, ContentRecord, EncryptedRecord, RecordId};
use crate::services::crypto::PayloadCipher;
use crate::utils::errors::{QuickyError, Result};
use super::ContentRepository;

#[derive(Debug, Default)]
struct MemoryState {
    next_bucket_id: i64,
    next_record_id: RecordId,
    buckets: Vec<BucketHandle>,
    records: Vec<EncryptedRecord>,
}

#[derive(Debug)]
pub struct InMemoryContentRepository {
    state: Mutex<MemoryState>,
    cipher: PayloadCipher,
}

impl InMemoryContentRepository {
    pub fn new(cipher: PayloadCipher) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            cipher,
        }
    }

    /// Number of stored records across all buckets
    pub async fn record_count(&self) -> usize {
        self.state.lock().await.records.len()
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn ensure_bucket(&self, user_id: &str, bucket_name: &str) -> Result<BucketHandle> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state
            .buckets
            .iter()
            .find(|b| b.user_id == user_id && b.bucket_name == bucket_name)
        {
            return Ok(existing.clone());
        }

        state.next_bucket_id += 1;
        let bucket = BucketHandle {
            id: state.next_bucket_id,
            user_id: user_id.to_string(),
            bucket_name: bucket_name.to_string(),
            created_at: Utc::now(),
        };
        state.buckets.push(bucket.clone());
        Ok(bucket)
    }

    async fn find_bucket(&self, user_id: &str, bucket_name: &str) -> Result<Option<BucketHandle>> {
        let state = self.state.lock().await;
        Ok(state
            .buckets
            .iter()
            .find(|b| b.user_id == user_id && b.bucket_name == bucket_name)
            .cloned())
    }

    async fn append_record(
        &self,
        bucket: &BucketHandle,
        recorded_at: DateTime<Utc>,
        payload: &str,
    ) -> Result<RecordId> {
        let sealed = self.cipher.encrypt(payload)?;
        let mut state = self.state.lock().await;

        if !state.buckets.iter().any(|b| b.id == bucket.id) {
            return Err(QuickyError::BucketNotFound {
                user_id: bucket.user_id.clone(),
                bucket_name: bucket.bucket_name.clone(),
            });
        }

        state.next_record_id += 1;
        let id = state.next_record_id;
        state.records.push(EncryptedRecord {
            id,
            bucket_id: bucket.id,
            recorded_at,
            payload: sealed,
        });
        Ok(id)
    }

    async fn list_records(&self, user_id: &str, bucket_name: &str) -> Result<Vec<ContentRecord>> {
        let state = self.state.lock().await;

        let bucket = state
            .buckets
            .iter()
            .find(|b| b.user_id == user_id && b.bucket_name == bucket_name)
            .ok_or_else(|| QuickyError::BucketNotFound {
                user_id: user_id.to_string(),
                bucket_name: bucket_name.to_string(),
            })?;

        let mut rows: Vec<&EncryptedRecord> = state
            .records
            .iter()
            .filter(|r| r.bucket_id == bucket.id)
            .collect();
        rows.sort_by_key(|r| (r.recorded_at, r.id));

        rows.into_iter()
            .map(|row| {
                Ok(ContentRecord {
                    id: row.id,
                    recorded_at: row.recorded_at,
                    payload: self.cipher.decrypt(&row.payload)?,
                })
            })
            .collect()
    }

    async fn list_buckets(&self, user_id: &str) -> Result<Vec<BucketHandle>> {
        let state = self.state.lock().await;
        Ok(state
            .buckets
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
