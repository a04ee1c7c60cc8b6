//! Outbound replies
//!
//! A `Reply` is the structured message the conversation layer hands to the
//! reply sink. Rendering into the platform's wire format lives in
//! `services::templates`.

use serde::{Deserialize, Serialize};
use crate::utils::helpers::truncate_text;

/// Longest text the Send API accepts, in characters
pub const MAX_TEXT_CHARS: usize = 2000;

/// Buckets shown per carousel page
pub const BUCKETS_PER_PAGE: usize = 9;

/// Largest bucket list still rendered as a plain button template
pub const BUTTON_LIST_LIMIT: usize = 3;

pub const NO_STORAGES: &str = "No storages found.";
pub const INVALID_SELECTION: &str = "Invalid selection. Please choose an option.";
pub const NOT_UNDERSTOOD: &str = "I didn't understand that. Click a button to proceed.";
pub const CLICK_GET_STARTED: &str = "Click 'Get Started' to begin.";
pub const ENTER_STORAGE_NAME: &str = "Please enter the storage name:";
pub const SEND_DATA: &str = "Please send a text message (image not yet supported).";
pub const SELECT_STORAGE_FIRST: &str = "Please select or create a storage first.";
pub const STORAGE_FAILURE: &str = "Sorry, something went wrong while accessing your storage. Please try again.";
pub const HELP_TEXT: &str = "QuickyMessenger keeps short notes in named storages. \
Create a storage, add text to it, and search your storages to read it back.";

/// Structured outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Plain text
    Text(String),
    /// "Get Started" / "Help" buttons
    GetStartedPrompt,
    /// Search / Create / Remove storage buttons
    ActionMenu,
    /// Add data / Exit buttons
    AddOrExitMenu,
    /// Buckets to open, `page` is 0-based
    BucketList { names: Vec<String>, page: usize },
    /// Buckets to remove, `page` is 0-based
    RemovableBucketList { names: Vec<String>, page: usize },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn storage_created(name: &str) -> Self {
        Reply::Text(format!("Storage created: *{}*", name))
    }

    pub fn data_stored(payload: &str) -> Self {
        Reply::Text(format!("Data stored: {}.", echo(payload, "Data stored: .".len())))
    }

    pub fn storage_header(name: &str) -> Self {
        Reply::Text(format!("Storage Name: {}", name))
    }

    pub fn no_data(name: &str) -> Self {
        Reply::Text(format!("No data found in storage: _{}_", name))
    }

    pub fn record(formatted_timestamp: &str, payload: &str) -> Self {
        let frame = "Timestamp:\n\n\nData:\n".len() + formatted_timestamp.chars().count();
        Reply::Text(format!(
            "Timestamp:\n{}\n\nData:\n{}",
            formatted_timestamp,
            echo(payload, frame)
        ))
    }

    pub fn invalid_name(reason: &str) -> Self {
        Reply::Text(format!("{} {}", reason, ENTER_STORAGE_NAME))
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Text(_) => "text",
            Reply::GetStartedPrompt => "get_started_prompt",
            Reply::ActionMenu => "action_menu",
            Reply::AddOrExitMenu => "add_or_exit_menu",
            Reply::BucketList { .. } => "bucket_list",
            Reply::RemovableBucketList { .. } => "removable_bucket_list",
        }
    }
}

/// User content cut so that it fits a text message next to `frame_chars`
/// characters of fixed wording
fn echo(payload: &str, frame_chars: usize) -> String {
    truncate_text(payload, MAX_TEXT_CHARS.saturating_sub(frame_chars))
}

/// Number of carousel pages needed for `count` buckets
pub fn page_count(count: usize) -> usize {
    count.div_ceil(BUCKETS_PER_PAGE)
}
