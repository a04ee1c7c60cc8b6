//! Conversation state machine
//!
//! Pure decision logic: given a session and an inbound event, compute the
//! next state and the ordered effects that get there. Nothing here performs
//! I/O. Effects that call storage always come before the `SetState` effect,
//! so a storage failure leaves the user where they were; replies that
//! describe the new state come after it.

use crate::models::reply::{
    page_count, Reply, CLICK_GET_STARTED, ENTER_STORAGE_NAME, HELP_TEXT, INVALID_SELECTION,
    NOT_UNDERSTOOD, NO_STORAGES, SELECT_STORAGE_FIRST, SEND_DATA,
};
use crate::models::EventKind;
use crate::utils::errors::Result;
use crate::utils::helpers::one_based_to_index;
use super::context::{ConversationState, Session};
use super::effect::Effect;
use super::postback::Postback;

/// Longest accepted bucket name, in characters
pub const MAX_BUCKET_NAME_CHARS: usize = 255;

/// Outcome of a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next_state: ConversationState,
    pub effects: Vec<Effect>,
}

impl Transition {
    /// No state change, no effects yet
    pub fn stay(state: ConversationState) -> Self {
        Self {
            next_state: state,
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Move to `state` at this point of the effect list
    pub fn enter(mut self, state: ConversationState) -> Self {
        self.next_state = state;
        self.effects.push(Effect::SetState(state));
        self
    }

    pub fn reply(self, reply: Reply) -> Self {
        self.with_effect(Effect::Reply(reply))
    }

    pub fn replies(&self) -> impl Iterator<Item = &Reply> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Reply(reply) => Some(reply),
            _ => None,
        })
    }
}

/// Decide what an event does to a session.
///
/// Fails only with `SelectionOutOfRange` for a numbered postback whose number
/// does not address an existing bucket or page.
pub fn transition(session: &Session, event: &EventKind) -> Result<Transition> {
    match event {
        EventKind::Postback(payload) => on_postback(session, Postback::parse(payload)),
        EventKind::Text(text) => Ok(on_text(session, text)),
    }
}

/// Reply for the first event of a freshly hydrated session. `None` when the
/// event is `GET_STARTED` and should be handled normally.
pub fn first_contact(event: &EventKind) -> Option<Transition> {
    match event {
        EventKind::Postback(payload) if Postback::parse(payload) == Postback::GetStarted => None,
        _ => Some(Transition::stay(ConversationState::AwaitingGetStarted).reply(Reply::GetStartedPrompt)),
    }
}

/// Correction for an unusable selection; back to the action menu
pub fn invalid_selection() -> Transition {
    Transition::stay(ConversationState::AwaitingAction)
        .enter(ConversationState::AwaitingAction)
        .reply(Reply::text(INVALID_SELECTION))
        .reply(Reply::ActionMenu)
}

fn on_postback(session: &Session, postback: Postback) -> Result<Transition> {
    use ConversationState::*;

    let state = session.state();

    if state == AwaitingGetStarted {
        return Ok(match postback {
            Postback::GetStarted => action_menu(state),
            Postback::Help => Transition::stay(state)
                .reply(Reply::text(HELP_TEXT))
                .reply(Reply::GetStartedPrompt),
            _ => get_started_reminder(),
        });
    }

    let transition = match (state, postback) {
        // Get Started and the persistent menu stay visible in every state
        (_, Postback::GetStarted) => action_menu(state),
        (_, Postback::Help) => Transition::stay(state)
            .enter(AwaitingAction)
            .reply(Reply::text(HELP_TEXT))
            .reply(Reply::ActionMenu),
        (_, Postback::SearchStorage) => bucket_menu(session, Searching),
        (_, Postback::CreateStorage) => Transition::stay(state)
            .enter(Creating)
            .reply(Reply::text(ENTER_STORAGE_NAME)),
        (_, Postback::RemoveStorage) => bucket_menu(session, Removing),

        (AwaitingAction, Postback::AddData) => match session.selected() {
            Some(_) => Transition::stay(state).enter(AwaitingData).reply(Reply::text(SEND_DATA)),
            None => select_first(state),
        },
        (StoringData, Postback::AddData) => {
            Transition::stay(state).enter(AwaitingData).reply(Reply::text(SEND_DATA))
        }
        (StoringData, Postback::Exit) => action_menu(state),

        (Searching, Postback::Storage(number)) => {
            let index = one_based_to_index(number, session.bucket_count())?;
            Transition::stay(state)
                .with_effect(Effect::ShowRecords { index })
                .with_effect(Effect::SelectBucket { index })
                .enter(StoringData)
                .reply(Reply::AddOrExitMenu)
        }
        (Searching, Postback::StoragePage(number)) => {
            let page = one_based_to_index(number, page_count(session.bucket_count()))?;
            Transition::stay(state).reply(Reply::BucketList {
                names: session.bucket_names(),
                page,
            })
        }

        (Removing, Postback::RemoveStorageAt(number)) => {
            let index = one_based_to_index(number, session.bucket_count())?;
            Transition::stay(state)
                .with_effect(Effect::RemoveBucket { index })
                .enter(AwaitingAction)
                .reply(Reply::ActionMenu)
        }
        (Removing, Postback::RemoveStoragePage(number)) => {
            let page = one_based_to_index(number, page_count(session.bucket_count()))?;
            Transition::stay(state).reply(Reply::RemovableBucketList {
                names: session.bucket_names(),
                page,
            })
        }

        _ => invalid_selection(),
    };

    Ok(transition)
}

fn on_text(session: &Session, text: &str) -> Transition {
    use ConversationState::*;

    let state = session.state();
    match state {
        AwaitingGetStarted => get_started_reminder(),
        Creating => create_bucket(session, text),
        // an open bucket keeps taking data without another ADD_DATA
        AwaitingData | StoringData => match session.selected() {
            Some(_) => Transition::stay(state)
                .with_effect(Effect::PersistRecord {
                    payload: text.to_string(),
                })
                .enter(StoringData)
                .reply(Reply::data_stored(text))
                .reply(Reply::AddOrExitMenu),
            None => select_first(state),
        },
        _ => Transition::stay(state)
            .enter(AwaitingAction)
            .reply(Reply::text(NOT_UNDERSTOOD))
            .reply(Reply::ActionMenu),
    }
}

fn create_bucket(session: &Session, text: &str) -> Transition {
    let name = text.trim();
    let state = session.state();

    let problem = if name.is_empty() {
        Some("The storage name cannot be empty.")
    } else if name.chars().count() > MAX_BUCKET_NAME_CHARS {
        Some("The storage name is too long (255 characters max).")
    } else if session.has_bucket(name) {
        Some("A storage with that name already exists.")
    } else {
        None
    };

    match problem {
        Some(reason) => Transition::stay(state).reply(Reply::invalid_name(reason)),
        None => Transition::stay(state)
            .with_effect(Effect::CreateBucket {
                name: name.to_string(),
            })
            .enter(ConversationState::StoringData)
            .reply(Reply::storage_created(name))
            .reply(Reply::AddOrExitMenu),
    }
}

/// Bucket list for searching or removing, or "no storages" when there is none
fn bucket_menu(session: &Session, target: ConversationState) -> Transition {
    let state = session.state();

    if session.bucket_count() == 0 {
        return Transition::stay(state)
            .enter(ConversationState::AwaitingAction)
            .reply(Reply::text(NO_STORAGES))
            .reply(Reply::ActionMenu);
    }

    let names = session.bucket_names();
    let list = match target {
        ConversationState::Removing => Reply::RemovableBucketList { names, page: 0 },
        _ => Reply::BucketList { names, page: 0 },
    };
    Transition::stay(state).enter(target).reply(list)
}

fn action_menu(from: ConversationState) -> Transition {
    Transition::stay(from)
        .enter(ConversationState::AwaitingAction)
        .reply(Reply::ActionMenu)
}

fn select_first(from: ConversationState) -> Transition {
    Transition::stay(from)
        .enter(ConversationState::AwaitingAction)
        .reply(Reply::text(SELECT_STORAGE_FIRST))
        .reply(Reply::ActionMenu)
}

fn get_started_reminder() -> Transition {
    Transition::stay(ConversationState::AwaitingGetStarted)
        .reply(Reply::text(CLICK_GET_STARTED))
        .reply(Reply::GetStartedPrompt)
}
