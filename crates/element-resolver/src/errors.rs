//! Error types for element resolution.

use std::fmt;

use thiserror::Error;

/// One failed resolution tier, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    /// Strategy name.
    pub strategy: String,

    /// Why it produced nothing.
    pub reason: String,
}

impl fmt::Display for StrategyAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Errors surfaced by the resolver chain.
#[derive(Debug, Error, Clone)]
pub enum ResolveError {
    /// Every tier was exhausted, including ghost match when recovery
    /// signals were available.
    #[error("element not found: {}", format_attempts(attempts))]
    NotFound {
        /// What each tier reported, in chain order.
        attempts: Vec<StrategyAttempt>,

        /// Whether recovery signals were present (ghost match was tried).
        recovery_present: bool,
    },

    /// A single strategy failed in a way worth surfacing on its own.
    #[error("strategy {strategy} failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },

    /// The page bridge stayed unreachable through the retry budget.
    #[error("page bridge unavailable: {0}")]
    BridgeUnavailable(String),

    /// Debugging-protocol command failed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The logical reference itself is unusable.
    #[error("invalid element reference: {0}")]
    InvalidReference(String),
}

fn format_attempts(attempts: &[StrategyAttempt]) -> String {
    if attempts.is_empty() {
        return "no strategies attempted".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
