//! Test data helpers for creating webhook payloads and content

use chrono::Utc;
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use serde_json::{json, Value};

pub const PAGE_ID: &str = "106774861234567";

/// One messaging item carrying a text message
pub fn text_messaging(sender: &str, text: &str) -> Value {
    json!({
        "sender": { "id": sender },
        "recipient": { "id": PAGE_ID },
        "timestamp": Utc::now().timestamp_millis(),
        "message": {
            "mid": format!("m_{}", uuid::Uuid::new_v4().simple()),
            "text": text
        }
    })
}

/// One messaging item carrying a postback
pub fn postback_messaging(sender: &str, payload: &str) -> Value {
    json!({
        "sender": { "id": sender },
        "recipient": { "id": PAGE_ID },
        "timestamp": Utc::now().timestamp_millis(),
        "postback": {
            "title": "Button",
            "payload": payload
        }
    })
}

/// A message echoed back by the platform for a page-sent message
pub fn echo_messaging(sender: &str, text: &str) -> Value {
    json!({
        "sender": { "id": PAGE_ID },
        "recipient": { "id": sender },
        "timestamp": Utc::now().timestamp_millis(),
        "message": {
            "mid": "m_echo",
            "is_echo": true,
            "text": text
        }
    })
}

/// A message with only an image attachment
pub fn attachment_messaging(sender: &str) -> Value {
    json!({
        "sender": { "id": sender },
        "recipient": { "id": PAGE_ID },
        "timestamp": Utc::now().timestamp_millis(),
        "message": {
            "mid": "m_image",
            "attachments": [{ "type": "image", "payload": { "url": "https://example.com/cat.png" } }]
        }
    })
}

/// A page webhook body with one entry holding `messaging`
pub fn webhook_body(messaging: Vec<Value>) -> Value {
    json!({
        "object": "page",
        "entry": [{
            "id": PAGE_ID,
            "time": Utc::now().timestamp_millis(),
            "messaging": messaging
        }]
    })
}

/// A random single-word storage name
pub fn fake_bucket_name() -> String {
    let word: String = Word().fake();
    format!("{}-{}", word, uuid::Uuid::new_v4().simple())
}

/// A random short note
pub fn fake_note() -> String {
    Sentence(3..8).fake()
}

/// `count` distinct storage names in creation order
pub fn numbered_bucket_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Storage {:02}", i)).collect()
}
