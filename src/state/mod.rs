//! State management module
//!
//! This module handles conversation state, per-user sessions and the
//! transition rules between states

pub mod context;
pub mod effect;
pub mod machine;
pub mod postback;
pub mod storage;

// Re-export commonly used state components
pub use context::{Bucket, ConversationState, Session};
pub use effect::Effect;
pub use machine::{transition, Transition};
pub use postback::Postback;
pub use storage::{SessionHandle, SessionStore};
