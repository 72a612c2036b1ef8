//! Error types for snapshot watching.

use thiserror::Error;

/// Errors surfaced by the differ/waiter layer.
#[derive(Debug, Error, Clone)]
pub enum WatchError {
    /// Snapshot polling failed repeatedly; the page bridge is unreachable.
    #[error("snapshot source unavailable: {0}")]
    SnapshotUnavailable(String),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

impl WatchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, WatchError::SnapshotUnavailable(_))
    }
}
