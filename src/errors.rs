//! Top-level error type for session and dispatch management.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum GripError {
    /// A session with this id is already open.
    #[error("session already open: {0}")]
    SessionExists(String),

    /// No open session under this id.
    #[error("unknown session: {0}")]
    SessionUnknown(String),

    /// Debugger attachment could not be acquired, even after displacing a
    /// stale holder.
    #[error("attachment failed: {0}")]
    Attachment(String),

    /// Bridge failure outside the per-action taxonomy.
    #[error("bridge error: {0}")]
    Bridge(String),
}
