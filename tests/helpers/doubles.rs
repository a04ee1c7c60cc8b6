//! Test doubles for the reply sink and the content repository

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use QuickyMessenger::database::{ContentRepository, InMemoryContentRepository};
use QuickyMessenger::models::{BucketHandle, ContentRecord, RecordId, Reply};
use QuickyMessenger::services::{PayloadCipher, ReplySink};
use QuickyMessenger::utils::errors::{QuickyError, Result};

/// Reply sink that records every reply in delivery order
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(String, Reply)>>,
    failing: Mutex<bool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail with a Messenger API error
    pub fn fail_sends(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// All recorded replies
    pub fn all(&self) -> Vec<(String, Reply)> {
        self.sent.lock().unwrap().clone()
    }

    /// Replies sent to one user, in order
    pub fn replies_for(&self, user_id: &str) -> Vec<Reply> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, reply)| reply.clone())
            .collect()
    }

    /// Drain and return the replies sent to one user
    pub fn take_for(&self, user_id: &str) -> Vec<Reply> {
        let mut sent = self.sent.lock().unwrap();
        let (taken, kept): (Vec<_>, Vec<_>) = sent.drain(..).partition(|(user, _)| user == user_id);
        *sent = kept;
        taken.into_iter().map(|(_, reply)| reply).collect()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, user_id: &str, reply: &Reply) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(QuickyError::MessengerApi {
                status: 500,
                body: "unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push((user_id.to_string(), reply.clone()));
        Ok(())
    }
}

/// Repository operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    ListBuckets,
    ListRecords,
    FindBucket,
    EnsureBucket,
    AppendRecord,
    /// `list_records` reports an undecryptable record
    Decryption,
}

/// In-memory repository with injectable faults, call counters and latency
pub struct FaultyRepository {
    inner: InMemoryContentRepository,
    faults: Mutex<HashSet<Fault>>,
    delay: Mutex<Duration>,
    list_buckets_calls: AtomicUsize,
    append_calls: AtomicUsize,
}

impl FaultyRepository {
    pub fn new() -> Self {
        Self {
            inner: InMemoryContentRepository::new(test_cipher()),
            faults: Mutex::new(HashSet::new()),
            delay: Mutex::new(Duration::ZERO),
            list_buckets_calls: AtomicUsize::new(0),
            append_calls: AtomicUsize::new(0),
        }
    }

    pub fn inject(&self, fault: Fault) {
        self.faults.lock().unwrap().insert(fault);
    }

    pub fn heal(&self, fault: Fault) {
        self.faults.lock().unwrap().remove(&fault);
    }

    /// Delay every repository call
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn list_buckets_calls(&self) -> usize {
        self.list_buckets_calls.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub async fn record_count(&self) -> usize {
        self.inner.record_count().await
    }

    async fn enter(&self, fault: Fault) -> Result<()> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let faults = self.faults.lock().unwrap().clone();
        if faults.contains(&fault) {
            return Err(QuickyError::Database(sqlx::Error::PoolTimedOut));
        }
        if fault == Fault::ListRecords && faults.contains(&Fault::Decryption) {
            return Err(QuickyError::Decryption("authentication tag mismatch".to_string()));
        }
        Ok(())
    }
}

impl Default for FaultyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentRepository for FaultyRepository {
    async fn ensure_bucket(&self, user_id: &str, bucket_name: &str) -> Result<BucketHandle> {
        self.enter(Fault::EnsureBucket).await?;
        self.inner.ensure_bucket(user_id, bucket_name).await
    }

    async fn find_bucket(&self, user_id: &str, bucket_name: &str) -> Result<Option<BucketHandle>> {
        self.enter(Fault::FindBucket).await?;
        self.inner.find_bucket(user_id, bucket_name).await
    }

    async fn append_record(
        &self,
        bucket: &BucketHandle,
        recorded_at: DateTime<Utc>,
        payload: &str,
    ) -> Result<RecordId> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(Fault::AppendRecord).await?;
        self.inner.append_record(bucket, recorded_at, payload).await
    }

    async fn list_records(&self, user_id: &str, bucket_name: &str) -> Result<Vec<ContentRecord>> {
        self.enter(Fault::ListRecords).await?;
        self.inner.list_records(user_id, bucket_name).await
    }

    async fn list_buckets(&self, user_id: &str) -> Result<Vec<BucketHandle>> {
        self.list_buckets_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(Fault::ListBuckets).await?;
        self.inner.list_buckets(user_id).await
    }

    async fn health_check(&self) -> Result<()> {
        self.inner.health_check().await
    }
}

/// Fixed key used across tests
pub fn test_cipher() -> PayloadCipher {
    PayloadCipher::new(&[7u8; 32]).expect("32-byte key")
}
