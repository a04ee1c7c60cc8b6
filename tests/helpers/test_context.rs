//! Test context for unified test setup
//!
//! Builds a `ConversationHandler` over a fault-injectable in-memory
//! repository and a recording reply sink, plus shortcuts for driving a
//! conversation.

use std::sync::Arc;
use QuickyMessenger::config::TimeoutConfig;
use QuickyMessenger::database::ContentRepository;
use QuickyMessenger::handlers::{ConversationHandler, HandleOutcome};
use QuickyMessenger::models::{EventKind, Reply};
use QuickyMessenger::services::ReplySink;
use QuickyMessenger::state::ConversationState;

use super::doubles::{FaultyRepository, RecordingSink};

/// Short bounds so timeout paths finish quickly
pub fn test_timeouts() -> TimeoutConfig {
    TimeoutConfig {
        storage_ms: 500,
        reply_ms: 500,
    }
}

/// Unified test context that manages all test components
pub struct TestContext {
    pub handler: Arc<ConversationHandler>,
    pub repository: Arc<FaultyRepository>,
    pub replies: Arc<RecordingSink>,
}

impl TestContext {
    /// Create a new test context with all components initialized
    pub fn new() -> Self {
        Self::with_repository(Arc::new(FaultyRepository::new()))
    }

    /// Build a context over an existing repository, e.g. to simulate a restart
    pub fn with_repository(repository: Arc<FaultyRepository>) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let replies = Arc::new(RecordingSink::new());
        let handler = Arc::new(ConversationHandler::new(
            repository.clone() as Arc<dyn ContentRepository>,
            replies.clone() as Arc<dyn ReplySink>,
            test_timeouts(),
        ));

        Self {
            handler,
            repository,
            replies,
        }
    }

    /// Same repository, empty session cache
    pub fn restarted(&self) -> Self {
        Self::with_repository(self.repository.clone())
    }

    pub async fn postback(&self, user_id: &str, token: &str) -> HandleOutcome {
        self.handler
            .handle_event(user_id, EventKind::Postback(token.to_string()))
            .await
    }

    pub async fn text(&self, user_id: &str, body: &str) -> HandleOutcome {
        self.handler
            .handle_event(user_id, EventKind::Text(body.to_string()))
            .await
    }

    /// Bring a new user to the action menu and forget the replies
    pub async fn start(&self, user_id: &str) {
        let outcome = self.postback(user_id, "GET_STARTED").await;
        assert_eq!(outcome.state, ConversationState::AwaitingAction);
        self.replies.take_for(user_id);
    }

    /// Create a storage from the action menu and return to it
    pub async fn create_bucket(&self, user_id: &str, name: &str) {
        self.postback(user_id, "CREATE_STORAGE").await;
        let outcome = self.text(user_id, name).await;
        assert_eq!(outcome.state, ConversationState::StoringData);
        self.postback(user_id, "EXIT").await;
        self.replies.take_for(user_id);
    }

    /// Replies to the user since the last call
    pub fn take_replies(&self, user_id: &str) -> Vec<Reply> {
        self.replies.take_for(user_id)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
