//! Conversation context
//!
//! Per-user session data: the current conversation state, the user's storage
//! buckets in display order and the currently selected bucket. Sessions are
//! mutated only through `SessionStore` / `SessionHandle` while the user's lock
//! is held.

use serde::{Deserialize, Serialize};
use crate::models::ContentRecord;
use crate::utils::errors::{QuickyError, Result};

/// Where a user is in the conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    AwaitingGetStarted,
    AwaitingAction,
    Searching,
    Creating,
    StoringData,
    AwaitingData,
    Removing,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::AwaitingGetStarted => "awaiting_get_started",
            ConversationState::AwaitingAction => "awaiting_action",
            ConversationState::Searching => "searching",
            ConversationState::Creating => "creating",
            ConversationState::StoringData => "storing_data",
            ConversationState::AwaitingData => "awaiting_data",
            ConversationState::Removing => "removing",
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named storage bucket as held in the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    name: String,
    records: Vec<ContentRecord>,
    persisted: bool,
}

impl Bucket {
    /// Bucket created in this conversation, not yet written to storage
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
            persisted: false,
        }
    }

    /// Bucket known to storage; its records are loaded when it is opened
    pub fn persisted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
            persisted: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records as last loaded or stored through this session
    pub fn records(&self) -> &[ContentRecord] {
        &self.records
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }
}

/// One user's conversation session
#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    state: ConversationState,
    buckets: Vec<Bucket>,
    selected_bucket: Option<usize>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::with_buckets(user_id, Vec::new())
    }

    /// Session rebuilt from stored buckets, starting at the initial state
    pub fn with_buckets(user_id: impl Into<String>, buckets: Vec<Bucket>) -> Self {
        Self {
            user_id: user_id.into(),
            state: ConversationState::default(),
            buckets,
            selected_bucket: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.iter().map(|b| b.name.clone()).collect()
    }

    pub fn has_bucket(&self, name: &str) -> bool {
        self.buckets.iter().any(|b| b.name == name)
    }

    pub fn selected_bucket(&self) -> Option<usize> {
        self.selected_bucket
    }

    pub fn selected(&self) -> Option<&Bucket> {
        self.selected_bucket.and_then(|i| self.buckets.get(i))
    }

    /// Bucket at a 0-based index
    pub fn bucket(&self, index: usize) -> Result<&Bucket> {
        self.buckets.get(index).ok_or(QuickyError::SelectionOutOfRange {
            index: index + 1,
            available: self.buckets.len(),
        })
    }

    pub(crate) fn set_state(&mut self, state: ConversationState) {
        self.state = state;
    }

    /// Append a bucket, returning its index
    pub(crate) fn add_bucket(&mut self, bucket: Bucket) -> Result<usize> {
        if self.has_bucket(&bucket.name) {
            return Err(QuickyError::DuplicateBucket {
                bucket_name: bucket.name,
            });
        }
        self.buckets.push(bucket);
        Ok(self.buckets.len() - 1)
    }

    pub(crate) fn select_bucket(&mut self, index: usize) -> Result<&Bucket> {
        self.bucket(index)?;
        self.selected_bucket = Some(index);
        Ok(&self.buckets[index])
    }

    /// Remove a bucket by index. The selection follows its bucket: cleared if
    /// that bucket goes, shifted down if an earlier one does.
    pub(crate) fn remove_bucket_at(&mut self, index: usize) -> Result<Bucket> {
        self.bucket(index)?;
        let removed = self.buckets.remove(index);

        self.selected_bucket = match self.selected_bucket {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };

        Ok(removed)
    }

    pub(crate) fn remove_bucket(&mut self, name: &str) -> Result<Bucket> {
        let index = self
            .buckets
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| QuickyError::BucketNotFound {
                user_id: self.user_id.clone(),
                bucket_name: name.to_string(),
            })?;
        self.remove_bucket_at(index)
    }

    /// Cache a freshly stored record; the bucket now exists in storage
    pub(crate) fn record_stored(&mut self, index: usize, record: ContentRecord) -> Result<()> {
        self.bucket(index)?;
        let bucket = &mut self.buckets[index];
        bucket.persisted = true;
        bucket.records.push(record);
        Ok(())
    }

    pub(crate) fn replace_records(&mut self, index: usize, records: Vec<ContentRecord>) -> Result<()> {
        self.bucket(index)?;
        self.buckets[index].records = records;
        Ok(())
    }
}
