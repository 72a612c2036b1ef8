//! Aggregated configuration for the action core.
//!
//! Every tunable lives on a typed struct with production defaults; an
//! orchestrator overrides only what it cares about via JSON.

use serde::{Deserialize, Serialize};

use action_executor::ExecutorConfig;
use element_resolver::GhostScoring;
use page_bridge::RetryPolicy;
use snapshot_watch::StabilizeConfig;

/// Top-level configuration, one section per subsystem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagegripConfig {
    /// Stabilization wait timing.
    pub stabilize: StabilizeConfig,

    /// Ghost-match scoring weights and thresholds.
    pub scoring: GhostScoring,

    /// Retry policy for page-bridge calls.
    pub retry: RetryPolicy,

    /// Execution pipeline timing and retry bounds.
    pub executor: ExecutorConfig,
}

impl PagegripConfig {
    /// Parse from JSON, filling omitted sections and fields with defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
