//! Side effects requested by a state transition

use crate::models::Reply;
use super::context::ConversationState;

/// One step of a transition, executed in order by the effect dispatcher.
/// Bucket indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a reply to the user
    Reply(Reply),
    /// Move the session to a new state
    SetState(ConversationState),
    /// Add a bucket to the session and select it. The storage row is written
    /// on first write, or reused when the name already has one.
    CreateBucket { name: String },
    SelectBucket { index: usize },
    RemoveBucket { index: usize },
    /// Load a bucket's records and reply with each of them
    ShowRecords { index: usize },
    /// Store a payload in the selected bucket
    PersistRecord { payload: String },
}

impl Effect {
    /// Whether the effect calls the content repository
    pub fn touches_storage(&self) -> bool {
        matches!(
            self,
            Effect::CreateBucket { .. } | Effect::ShowRecords { .. } | Effect::PersistRecord { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Reply(_) => "reply",
            Effect::SetState(_) => "set_state",
            Effect::CreateBucket { .. } => "create_bucket",
            Effect::SelectBucket { .. } => "select_bucket",
            Effect::RemoveBucket { .. } => "remove_bucket",
            Effect::ShowRecords { .. } => "show_records",
            Effect::PersistRecord { .. } => "persist_record",
        }
    }
}
