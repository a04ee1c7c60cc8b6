//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::future::Future;
use std::time::Duration;
use chrono::{DateTime, Utc};
use crate::utils::errors::{QuickyError, Result};

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%B %-d, %Y %-I:%M %p UTC").to_string()
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Convert a 1-based wire number into a 0-based index below `len`
pub fn one_based_to_index(number: usize, len: usize) -> Result<usize> {
    if number == 0 || number > len {
        return Err(QuickyError::SelectionOutOfRange {
            index: number,
            available: len,
        });
    }
    Ok(number - 1)
}

/// Await `future` for at most `limit`, mapping expiry to `on_timeout()`
pub async fn with_timeout<T, F, E>(limit: Duration, future: F, on_timeout: E) -> Result<T>
where
    F: Future<Output = Result<T>>,
    E: FnOnce() -> QuickyError,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}
