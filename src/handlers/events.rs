//! Inbound event handling
//!
//! `ConversationHandler::handle_event` is the entry point used by the
//! transport. For each event it locks the user's session (hydrating it on
//! first touch), asks the state machine for a transition and dispatches the
//! resulting effects while still holding the lock. Every failure is
//! recovered here and summarised in the returned `HandleOutcome`.

use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;
use crate::config::TimeoutConfig;
use crate::database::repositories::ContentRepository;
use crate::models::reply::STORAGE_FAILURE;
use crate::models::{EventKind, InboundEvent, Reply};
use crate::services::ReplySink;
use crate::state::machine::{self, Transition};
use crate::state::{ConversationState, SessionHandle, SessionStore};
use crate::utils::errors::{ErrorKind, QuickyError, Result};
use crate::utils::logging::log_user_action;
use super::dispatcher::{DispatchReport, EffectDispatcher};

/// Summary of one handled event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleOutcome {
    /// Session state after the event
    pub state: ConversationState,
    /// Failure class, if anything went wrong
    pub error: Option<ErrorKind>,
    /// Whether the session was loaded from storage for this event
    pub hydrated: bool,
}

pub struct ConversationHandler {
    sessions: Arc<SessionStore>,
    dispatcher: EffectDispatcher,
}

impl ConversationHandler {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        replies: Arc<dyn ReplySink>,
        timeouts: TimeoutConfig,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(repository.clone(), timeouts.storage()));
        Self::with_sessions(sessions, repository, replies, timeouts)
    }

    /// Build around an existing session store
    pub fn with_sessions(
        sessions: Arc<SessionStore>,
        repository: Arc<dyn ContentRepository>,
        replies: Arc<dyn ReplySink>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            sessions,
            dispatcher: EffectDispatcher::new(repository, replies, timeouts),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub async fn handle_inbound(&self, event: InboundEvent) -> HandleOutcome {
        self.handle_event(&event.user_id, event.kind).await
    }

    /// Process one event for one user. Never fails; see `HandleOutcome`.
    pub async fn handle_event(&self, user_id: &str, kind: EventKind) -> HandleOutcome {
        let span = info_span!("handle_event", event_id = %Uuid::new_v4(), user_id = user_id, kind = kind.label());
        self.process(user_id, kind).instrument(span).await
    }

    /// Check the content repository
    pub async fn health_check(&self) -> Result<()> {
        self.dispatcher.repository().health_check().await
    }

    async fn process(&self, user_id: &str, kind: EventKind) -> HandleOutcome {
        if let Err(e) = validate(user_id, &kind) {
            warn!(error = %e, "Dropping malformed event");
            return HandleOutcome {
                state: self.sessions.get_state(user_id).await.unwrap_or_default(),
                error: Some(ErrorKind::MalformedEvent),
                hydrated: false,
            };
        }

        let mut session = match self.sessions.get_or_create(user_id).await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, kind = %e.kind(), "Failed to load session");
                self.dispatcher.notify(user_id, &Reply::text(STORAGE_FAILURE)).await;
                return HandleOutcome {
                    state: ConversationState::default(),
                    error: Some(surfaced(e.kind())),
                    hydrated: false,
                };
            }
        };

        let hydrated = session.was_hydrated();
        let from = session.get_state();
        log_user_action(user_id, kind.label(), Some(from.as_str()));

        let (transition, mut error) = decide(&session, &kind);
        if let Some(rejected) = error {
            info!(state = %from, error = %rejected, "Selection rejected");
        }

        match self.apply(&mut session, transition).await {
            Ok(report) if report.replies_failed > 0 && error.is_none() => {
                error = Some(ErrorKind::ReplyDeliveryFailure);
            }
            Ok(_) => {}
            Err(e) => error = Some(surfaced(e.kind())),
        }

        HandleOutcome {
            state: session.get_state(),
            error,
            hydrated,
        }
    }

    /// Dispatch a transition. On failure the user gets the matching
    /// correction or failure notice before the error is returned.
    async fn apply(&self, session: &mut SessionHandle, transition: Transition) -> Result<DispatchReport> {
        let state = session.get_state();

        let failure = match self.dispatcher.dispatch(session, transition.effects).await {
            Ok(report) => return Ok(report),
            Err(e) => e,
        };

        if failure.kind() == ErrorKind::SelectionOutOfRange {
            warn!(state = %state, error = %failure, "Selection failed while applying effects");
            self.dispatcher.dispatch(session, machine::invalid_selection().effects).await?;
        } else {
            error!(state = %state, error = %failure, kind = %failure.kind(), "Failed to apply transition");
            self.dispatcher.notify(session.user_id(), &Reply::text(STORAGE_FAILURE)).await;
        }

        Err(failure)
    }
}

/// Reject events that carry nothing to act on
fn validate(user_id: &str, kind: &EventKind) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(QuickyError::MalformedEvent("empty user id".to_string()));
    }

    let content = match kind {
        EventKind::Postback(payload) => payload,
        EventKind::Text(text) => text,
    };
    if content.trim().is_empty() {
        return Err(QuickyError::MalformedEvent(format!("empty {}", kind.label())));
    }

    Ok(())
}

/// Pick the transition for an event. A bad selection becomes the
/// invalid-selection correction and is reported alongside it.
fn decide(session: &SessionHandle, kind: &EventKind) -> (Transition, Option<ErrorKind>) {
    if session.was_hydrated() {
        if let Some(transition) = machine::first_contact(kind) {
            return (transition, None);
        }
    }

    match machine::transition(session, kind) {
        Ok(transition) => (transition, None),
        Err(e) => (machine::invalid_selection(), Some(e.kind())),
    }
}

/// Decryption failures reach the user as ordinary storage failures
fn surfaced(kind: ErrorKind) -> ErrorKind {
    match kind {
        ErrorKind::DecryptionFailure => ErrorKind::StorageFailure,
        other => other,
    }
}
