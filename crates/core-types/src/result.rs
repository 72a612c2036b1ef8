//! Structured action results and the error taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failure categories surfaced to the orchestrator.
///
/// `Obstructed`, `GeometryUnavailable` and `ElementNotFound` mean "try a
/// different strategy"; `NoSideEffect` means the page may not be ready yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionErrorCode {
    /// All resolution tiers exhausted.
    ElementNotFound,

    /// Hit-test mismatch; the click was withheld.
    Obstructed,

    /// Dispatched but no observable change after one retry.
    NoSideEffect,

    /// No usable coordinates could be established.
    GeometryUnavailable,

    /// A bounded wait expired.
    Timeout,

    /// Transport or debugging-bridge failure.
    ProtocolError,

    /// Page-bridge RPC unreachable after retries.
    ContentBridgeUnavailable,
}

impl ActionErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionErrorCode::ElementNotFound => "ELEMENT_NOT_FOUND",
            ActionErrorCode::Obstructed => "OBSTRUCTED",
            ActionErrorCode::NoSideEffect => "NO_SIDE_EFFECT",
            ActionErrorCode::GeometryUnavailable => "GEOMETRY_UNAVAILABLE",
            ActionErrorCode::Timeout => "TIMEOUT",
            ActionErrorCode::ProtocolError => "PROTOCOL_ERROR",
            ActionErrorCode::ContentBridgeUnavailable => "CONTENT_BRIDGE_UNAVAILABLE",
        }
    }

    /// Whether the orchestrator may reasonably retry the whole turn.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ActionErrorCode::NoSideEffect
                | ActionErrorCode::Timeout
                | ActionErrorCode::ProtocolError
                | ActionErrorCode::ContentBridgeUnavailable
        )
    }
}

/// Structured failure attached to an action result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionFailure {
    /// Human-readable description.
    pub message: String,

    /// Taxonomy code.
    pub code: ActionErrorCode,

    /// Which action was being executed.
    pub action: String,

    /// Element index the action targeted, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<u32>,
}

/// Result object returned for every requested action. The core never lets a
/// failure escape this boundary as a panic or raw error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionExecutionResult {
    /// Whether the action succeeded.
    pub success: bool,

    /// Structured failure details, present when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionFailure>,

    /// Description of the observed state after the action, e.g. a note that
    /// the target was recovered via ghost match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_state: Option<String>,

    /// When execution started.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    /// When execution finished.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    /// Total latency in milliseconds.
    pub latency_ms: u64,
}

impl ActionExecutionResult {
    pub fn success(started_at: DateTime<Utc>, latency_ms: u64) -> Self {
        Self {
            success: true,
            error: None,
            actual_state: None,
            started_at,
            finished_at: Utc::now(),
            latency_ms,
        }
    }

    pub fn failure(started_at: DateTime<Utc>, latency_ms: u64, failure: ActionFailure) -> Self {
        Self {
            success: false,
            error: Some(failure),
            actual_state: None,
            started_at,
            finished_at: Utc::now(),
            latency_ms,
        }
    }

    pub fn with_actual_state(mut self, state: impl Into<String>) -> Self {
        self.actual_state = Some(state.into());
        self
    }
}
