//! Error types for action execution.

use thiserror::Error;

use element_resolver::ResolveError;
use page_bridge::{BridgeError, BridgeErrorKind};
use pagegrip_core_types::ActionErrorCode;
use snapshot_watch::WatchError;

/// Failure taxonomy surfaced by the executor.
#[derive(Debug, Error, Clone)]
pub enum ExecError {
    /// All resolution tiers exhausted.
    #[error("element not found: {0}")]
    NotFound(String),

    /// Hit-test mismatch; the click was withheld.
    #[error("target obstructed: {0}")]
    Obstructed(String),

    /// Dispatched but nothing observable changed, even after one retry.
    #[error("no side effect: {0}")]
    NoSideEffect(String),

    /// No usable coordinates could be established.
    #[error("geometry unavailable: {0}")]
    GeometryUnavailable(String),

    /// A bounded wait expired.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Operation was cancelled at a checkpoint.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Debugging-bridge command failed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Page bridge unreachable after retries.
    #[error("content bridge unavailable: {0}")]
    BridgeUnavailable(String),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExecError {
    /// Taxonomy code reported to the orchestrator.
    pub fn code(&self) -> ActionErrorCode {
        match self {
            ExecError::NotFound(_) => ActionErrorCode::ElementNotFound,
            ExecError::Obstructed(_) => ActionErrorCode::Obstructed,
            ExecError::NoSideEffect(_) => ActionErrorCode::NoSideEffect,
            ExecError::GeometryUnavailable(_) => ActionErrorCode::GeometryUnavailable,
            ExecError::Timeout(_) | ExecError::Cancelled(_) => ActionErrorCode::Timeout,
            ExecError::Protocol(_) | ExecError::Internal(_) => ActionErrorCode::ProtocolError,
            ExecError::BridgeUnavailable(_) => ActionErrorCode::ContentBridgeUnavailable,
        }
    }
}

impl From<ResolveError> for ExecError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::BridgeUnavailable(msg) => ExecError::BridgeUnavailable(msg),
            ResolveError::Protocol(msg) => ExecError::Protocol(msg),
            other => ExecError::NotFound(other.to_string()),
        }
    }
}

impl From<BridgeError> for ExecError {
    fn from(err: BridgeError) -> Self {
        match err.kind {
            BridgeErrorKind::BridgeUnavailable => ExecError::BridgeUnavailable(err.to_string()),
            BridgeErrorKind::Timeout => ExecError::Timeout(err.to_string()),
            _ => ExecError::Protocol(err.to_string()),
        }
    }
}

impl From<WatchError> for ExecError {
    fn from(err: WatchError) -> Self {
        match err {
            WatchError::SnapshotUnavailable(msg) => ExecError::BridgeUnavailable(msg),
            WatchError::Internal(msg) => ExecError::Internal(msg),
        }
    }
}
