//! Database module
//!
//! This module handles database connections and content storage

pub mod connection;
pub mod repositories;

// Re-export commonly used database components
pub use connection::{DatabasePool, create_pool, run_migrations, health_check};
pub use repositories::{ContentRepository, PgContentRepository, InMemoryContentRepository};
