//! Messenger webhook payloads and the decoded inbound event

use serde::{Deserialize, Serialize};
use crate::utils::errors::{QuickyError, Result};

/// Body of a webhook POST
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub messaging: Vec<MessagingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingItem {
    #[serde(default)]
    pub sender: Option<Participant>,
    #[serde(default)]
    pub recipient: Option<Participant>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub postback: Option<IncomingPostback>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_echo: bool,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingPostback {
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// What the user did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Button press carrying a payload token
    Postback(String),
    /// Free text typed by the user
    Text(String),
}

impl EventKind {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Postback(_) => "postback",
            EventKind::Text(_) => "text",
        }
    }
}

/// One decoded inbound event for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user_id: String,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(user_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
        }
    }

    /// Decode a messaging item. A non-empty postback payload wins over text;
    /// echoes, attachment-only messages and empty content are malformed.
    pub fn from_messaging(item: &MessagingItem) -> Result<Self> {
        let user_id = item
            .sender
            .as_ref()
            .map(|sender| sender.id.trim())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| QuickyError::MalformedEvent("missing sender id".to_string()))?;

        if let Some(payload) = item
            .postback
            .as_ref()
            .and_then(|postback| postback.payload.as_deref())
            .filter(|payload| !payload.is_empty())
        {
            return Ok(Self::new(user_id, EventKind::Postback(payload.to_string())));
        }

        let message = item
            .message
            .as_ref()
            .ok_or_else(|| QuickyError::MalformedEvent("neither postback nor message present".to_string()))?;

        if message.is_echo {
            return Err(QuickyError::MalformedEvent("echo of an outbound message".to_string()));
        }

        match message.text.as_deref().filter(|text| !text.trim().is_empty()) {
            Some(text) => Ok(Self::new(user_id, EventKind::Text(text.to_string()))),
            None if !message.attachments.is_empty() => Err(QuickyError::MalformedEvent(
                "attachments without text are not supported".to_string(),
            )),
            None => Err(QuickyError::MalformedEvent("empty message".to_string())),
        }
    }
}

impl WebhookPayload {
    /// Decode every messaging item, keeping failures alongside their position
    pub fn events(&self) -> Vec<Result<InboundEvent>> {
        self.entry
            .iter()
            .flat_map(|entry| entry.messaging.iter())
            .map(InboundEvent::from_messaging)
            .collect()
    }
}
