//! Executor tuning knobs.

use serde::{Deserialize, Serialize};

/// Timing and retry bounds for the execution pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Settle delay before the hydration-gap check re-probes the page.
    pub settle_delay_ms: u64,

    /// Attempts to establish usable geometry before giving up.
    pub geometry_attempts: u32,

    /// Randomized inter-key delay bounds for set-value keystrokes.
    pub key_delay_min_ms: u64,
    pub key_delay_max_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 300,
            geometry_attempts: 3,
            key_delay_min_ms: 15,
            key_delay_max_ms: 45,
        }
    }
}
