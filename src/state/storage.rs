//! Session storage
//!
//! Process-lifetime cache of conversation sessions. Each user owns one slot in
//! a sharded map; the slot is an async mutex, so events of the same user are
//! handled one at a time in the order they asked for the lock while different
//! users proceed independently. A session is hydrated from the content
//! repository the first time its user is seen, under the slot lock, so
//! concurrent first events hydrate exactly once.

use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMappedMutexGuard, OwnedMutexGuard};
use tracing::{debug, info};
use crate::database::repositories::ContentRepository;
use crate::models::ContentRecord;
use crate::utils::errors::{QuickyError, Result};
use crate::utils::helpers::with_timeout;
use crate::utils::logging::log_storage_operation;
use super::context::{Bucket, ConversationState, Session};

type Slot = Arc<Mutex<Option<Session>>>;

/// Concurrent per-user session store
pub struct SessionStore {
    sessions: DashMap<String, Slot>,
    repository: Arc<dyn ContentRepository>,
    storage_timeout: Duration,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn ContentRepository>, storage_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            repository,
            storage_timeout,
        }
    }

    /// Lock the user's session, hydrating it from storage on first touch
    pub async fn get_or_create(&self, user_id: &str) -> Result<SessionHandle> {
        let slot = self.slot(user_id);
        let mut guard = slot.lock_owned().await;

        let hydrated = if guard.is_none() {
            *guard = Some(self.hydrate(user_id).await?);
            true
        } else {
            false
        };

        let guard = OwnedMutexGuard::try_map(guard, |session| session.as_mut()).map_err(|_| {
            QuickyError::SessionNotFound {
                user_id: user_id.to_string(),
            }
        })?;

        Ok(SessionHandle { guard, hydrated })
    }

    /// Current state, `None` for a user never seen
    pub async fn get_state(&self, user_id: &str) -> Option<ConversationState> {
        let slot = self.existing_slot(user_id)?;
        let guard = slot.lock().await;
        guard.as_ref().map(Session::state)
    }

    pub async fn set_state(&self, user_id: &str, state: ConversationState) -> Result<()> {
        let mut session = self.existing(user_id).await?;
        session.set_state(state);
        Ok(())
    }

    /// Append a bucket to the user's session, returning its index
    pub async fn add_bucket(&self, user_id: &str, bucket: Bucket) -> Result<usize> {
        let mut session = self.existing(user_id).await?;
        session.add_bucket(bucket)
    }

    pub async fn remove_bucket(&self, user_id: &str, bucket_name: &str) -> Result<Bucket> {
        let mut session = self.existing(user_id).await?;
        session.remove_bucket(bucket_name)
    }

    pub async fn list_bucket_names(&self, user_id: &str) -> Result<Vec<String>> {
        let session = self.existing(user_id).await?;
        Ok(session.bucket_names())
    }

    /// Select the bucket at a 0-based index
    pub async fn select_bucket(&self, user_id: &str, index: usize) -> Result<Bucket> {
        let mut session = self.existing(user_id).await?;
        let bucket = session.select_bucket(index)?.clone();
        Ok(bucket)
    }

    /// Number of cached sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    fn slot(&self, user_id: &str) -> Slot {
        let entry = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)));
        Arc::clone(&*entry)
    }

    fn existing_slot(&self, user_id: &str) -> Option<Slot> {
        self.sessions.get(user_id).map(|entry| Arc::clone(&*entry))
    }

    async fn existing(&self, user_id: &str) -> Result<SessionHandle> {
        let not_found = || QuickyError::SessionNotFound {
            user_id: user_id.to_string(),
        };

        let slot = self.existing_slot(user_id).ok_or_else(not_found)?;
        let guard = slot.lock_owned().await;
        let guard = OwnedMutexGuard::try_map(guard, |session| session.as_mut()).map_err(|_| not_found())?;

        Ok(SessionHandle {
            guard,
            hydrated: false,
        })
    }

    /// Rebuild a session from the user's stored bucket names. Records stay
    /// in storage until a bucket is opened.
    async fn hydrate(&self, user_id: &str) -> Result<Session> {
        let started = Instant::now();

        let handles = with_timeout(
            self.storage_timeout,
            self.repository.list_buckets(user_id),
            || QuickyError::StorageTimeout { operation: "list_buckets" },
        )
        .await;

        log_storage_operation(
            "hydrate_session",
            user_id,
            started.elapsed().as_millis() as u64,
            handles.is_ok(),
        );

        let buckets: Vec<Bucket> = handles?
            .into_iter()
            .map(|handle| Bucket::persisted(handle.bucket_name))
            .collect();

        info!(user_id = user_id, buckets = buckets.len(), "Session hydrated");
        Ok(Session::with_buckets(user_id, buckets))
    }
}

/// Exclusive access to one user's session for the duration of an event
pub struct SessionHandle {
    guard: OwnedMappedMutexGuard<Option<Session>, Session>,
    hydrated: bool,
}

impl SessionHandle {
    /// Whether this call loaded the session from storage
    pub fn was_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn get_state(&self) -> ConversationState {
        self.guard.state()
    }

    pub fn set_state(&mut self, state: ConversationState) {
        debug!(user_id = self.guard.user_id(), state = %state, "Setting conversation state");
        self.guard.set_state(state);
    }

    pub fn add_bucket(&mut self, bucket: Bucket) -> Result<usize> {
        self.guard.add_bucket(bucket)
    }

    pub fn remove_bucket(&mut self, bucket_name: &str) -> Result<Bucket> {
        self.guard.remove_bucket(bucket_name)
    }

    pub fn remove_bucket_at(&mut self, index: usize) -> Result<Bucket> {
        self.guard.remove_bucket_at(index)
    }

    pub fn list_bucket_names(&self) -> Vec<String> {
        self.guard.bucket_names()
    }

    pub fn select_bucket(&mut self, index: usize) -> Result<&Bucket> {
        self.guard.select_bucket(index)
    }

    pub fn record_stored(&mut self, index: usize, record: ContentRecord) -> Result<()> {
        self.guard.record_stored(index, record)
    }

    pub fn replace_records(&mut self, index: usize, records: Vec<ContentRecord>) -> Result<()> {
        self.guard.replace_records(index, records)
    }
}

impl Deref for SessionHandle {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use crate::database::repositories::InMemoryContentRepository;
    use crate::services::crypto::PayloadCipher;

    fn store() -> (SessionStore, Arc<InMemoryContentRepository>) {
        let repository = Arc::new(InMemoryContentRepository::new(
            PayloadCipher::from_base64(&PayloadCipher::generate_key()).unwrap(),
        ));
        let store = SessionStore::new(repository.clone(), Duration::from_secs(1));
        (store, repository)
    }

    #[tokio::test]
    async fn test_first_touch_hydrates_once() {
        let (store, _) = store();

        let first = store.get_or_create("u1").await.unwrap();
        assert!(first.was_hydrated());
        drop(first);

        let second = store.get_or_create("u1").await.unwrap();
        assert!(!second.was_hydrated());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_hydration_loads_stored_buckets() {
        let (store, repository) = store();
        let bucket = repository.ensure_bucket("u1", "Groceries").await.unwrap();
        repository.append_record(&bucket, Utc::now(), "Milk").await.unwrap();
        repository.ensure_bucket("u1", "Empty").await.unwrap();

        let session = store.get_or_create("u1").await.unwrap();

        assert_eq!(session.list_bucket_names(), vec!["Groceries", "Empty"]);
        assert!(session.buckets().iter().all(Bucket::is_persisted));
        assert!(session.buckets()[0].records().is_empty());
        assert_eq!(session.get_state(), ConversationState::AwaitingGetStarted);
    }

    #[tokio::test]
    async fn test_store_operations_need_a_session() {
        let (store, _) = store();

        assert_eq!(store.get_state("ghost").await, None);
        assert_matches!(
            store.set_state("ghost", ConversationState::AwaitingAction).await,
            Err(QuickyError::SessionNotFound { .. })
        );
        assert!(!store.contains("ghost"));
    }

    #[tokio::test]
    async fn test_store_level_mutations() {
        let (store, _) = store();
        drop(store.get_or_create("u1").await.unwrap());

        store.add_bucket("u1", Bucket::new("A")).await.unwrap();
        store.add_bucket("u1", Bucket::new("B")).await.unwrap();
        store.set_state("u1", ConversationState::Searching).await.unwrap();

        assert_eq!(store.get_state("u1").await, Some(ConversationState::Searching));
        assert_eq!(store.select_bucket("u1", 1).await.unwrap().name(), "B");
        assert_matches!(
            store.select_bucket("u1", 2).await,
            Err(QuickyError::SelectionOutOfRange { .. })
        );

        store.remove_bucket("u1", "A").await.unwrap();
        assert_eq!(store.list_bucket_names("u1").await.unwrap(), vec!["B"]);
    }
}
