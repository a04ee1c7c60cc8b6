//! Test helpers module
//!
//! This module provides utilities and helpers for testing QuickyMessenger.
//! It includes test doubles for the reply sink and repository, a Messenger
//! API mock server, database helpers, and test context setup.

#![allow(dead_code)]

pub mod doubles;
pub mod messenger_mock;
pub mod database_helper;
pub mod test_context;
pub mod test_data;

pub use doubles::*;
pub use messenger_mock::*;
pub use database_helper::*;
pub use test_context::*;
pub use test_data::*;
