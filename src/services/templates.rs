//! Send API message templates
//!
//! Renders a `Reply` into the JSON body the Messenger Send API expects:
//! plain text, a button template, or a generic template used as a carousel.

use serde::Serialize;
use crate::models::reply::{page_count, Reply, BUCKETS_PER_PAGE, BUTTON_LIST_LIMIT};
use crate::state::postback::Postback;
use crate::utils::helpers::truncate_text;

const BUTTON_TITLE_CHARS: usize = 20;
const ELEMENT_TITLE_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendRequest {
    pub recipient: Recipient,
    pub messaging_type: &'static str,
    pub message: OutgoingMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipient {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    Text { text: String },
    Attachment { attachment: Attachment },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: TemplatePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "template_type", rename_all = "lowercase")]
pub enum TemplatePayload {
    Button { text: String, buttons: Vec<Button> },
    Generic { elements: Vec<Element> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub payload: String,
}

impl Button {
    pub fn postback(title: &str, postback: Postback) -> Self {
        Self {
            kind: "postback",
            title: truncate_text(title, BUTTON_TITLE_CHARS),
            payload: postback.to_payload(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub buttons: Vec<Button>,
}

/// Body for `POST /me/messenger_profile`
#[derive(Debug, Clone, Serialize)]
pub struct ProfileRequest {
    pub get_started: GetStarted,
    pub persistent_menu: Vec<PersistentMenu>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetStarted {
    pub payload: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistentMenu {
    pub locale: &'static str,
    pub composer_input_disabled: bool,
    pub call_to_actions: Vec<Button>,
}

/// Render a reply addressed to `user_id`
pub fn render(user_id: &str, reply: &Reply) -> SendRequest {
    let message = match reply {
        Reply::Text(text) => OutgoingMessage::Text { text: text.clone() },
        Reply::GetStartedPrompt => button_template(
            "What would you like to do?",
            vec![
                Button::postback("Get Started 🚀", Postback::GetStarted),
                Button::postback("Help ❓", Postback::Help),
            ],
        ),
        Reply::ActionMenu => button_template("What would you like to do?", action_buttons()),
        Reply::AddOrExitMenu => button_template(
            "Do you want to add more data or exit?",
            vec![
                Button::postback("Add Data", Postback::AddData),
                Button::postback("Exit", Postback::Exit),
            ],
        ),
        Reply::BucketList { names, page } => bucket_list(
            "Select a storage:",
            names,
            *page,
            Postback::Storage,
            Postback::StoragePage,
        ),
        Reply::RemovableBucketList { names, page } => bucket_list(
            "Select a storage to remove:",
            names,
            *page,
            Postback::RemoveStorageAt,
            Postback::RemoveStoragePage,
        ),
    };

    SendRequest {
        recipient: Recipient {
            id: user_id.to_string(),
        },
        messaging_type: "RESPONSE",
        message,
    }
}

/// Get Started button plus the always-visible menu
pub fn messenger_profile() -> ProfileRequest {
    ProfileRequest {
        get_started: GetStarted {
            payload: Postback::GetStarted.to_payload(),
        },
        persistent_menu: vec![PersistentMenu {
            locale: "default",
            composer_input_disabled: false,
            call_to_actions: action_buttons(),
        }],
    }
}

fn action_buttons() -> Vec<Button> {
    vec![
        Button::postback("Search Storage 🔍", Postback::SearchStorage),
        Button::postback("Create Storage ✍️", Postback::CreateStorage),
        Button::postback("Remove Storage ❌", Postback::RemoveStorage),
    ]
}

fn button_template(text: &str, buttons: Vec<Button>) -> OutgoingMessage {
    OutgoingMessage::Attachment {
        attachment: Attachment {
            kind: "template",
            payload: TemplatePayload::Button {
                text: text.to_string(),
                buttons,
            },
        },
    }
}

/// Buttons for a short list, otherwise one carousel page with a trailing
/// "more" card when further pages exist. Wire numbers are 1-based.
fn bucket_list(
    prompt: &str,
    names: &[String],
    page: usize,
    select: fn(usize) -> Postback,
    next_page: fn(usize) -> Postback,
) -> OutgoingMessage {
    if names.len() <= BUTTON_LIST_LIMIT {
        let buttons = names
            .iter()
            .enumerate()
            .map(|(i, name)| Button::postback(name, select(i + 1)))
            .collect();
        return button_template(prompt, buttons);
    }

    let pages = page_count(names.len());
    let page = page.min(pages.saturating_sub(1));
    let start = page * BUCKETS_PER_PAGE;
    let end = (start + BUCKETS_PER_PAGE).min(names.len());

    let mut elements: Vec<Element> = names[start..end]
        .iter()
        .enumerate()
        .map(|(offset, name)| {
            let number = start + offset + 1;
            Element {
                title: truncate_text(name, ELEMENT_TITLE_CHARS),
                subtitle: Some(format!("Storage {} of {}", number, names.len())),
                buttons: vec![Button::postback("Select", select(number))],
            }
        })
        .collect();

    if page + 1 < pages {
        elements.push(Element {
            title: "More storages".to_string(),
            subtitle: Some(format!("Page {} of {}", page + 2, pages)),
            buttons: vec![Button::postback("Show more", next_page(page + 2))],
        });
    }

    OutgoingMessage::Attachment {
        attachment: Attachment {
            kind: "template",
            payload: TemplatePayload::Generic { elements },
        },
    }
}
