//! Handlers module
//!
//! This module turns inbound webhook events into conversation updates:
//! - The webhook transport decoding Messenger payloads
//! - The event queue keeping each user's events in arrival order
//! - The event handler driving the state machine per user
//! - The effect dispatcher performing storage calls and replies

pub mod dispatcher;
pub mod events;
pub mod queue;
pub mod webhook;

// Re-export commonly used handler types
pub use dispatcher::{DispatchReport, EffectDispatcher};
pub use events::{ConversationHandler, HandleOutcome};
pub use queue::EventQueue;
pub use webhook::{create_router, AppState};
