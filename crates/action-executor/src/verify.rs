//! Post-action verification.
//!
//! Every action is followed by a stabilization wait and a snapshot diff
//! against the pre-action baseline; the resulting change report rides on
//! the action result for the next agent turn. Verification failures never
//! turn a dispatched action into a failed one.

use std::sync::Arc;

use tracing::{debug, warn};

use page_bridge::PageBridge;
use pagegrip_core_types::ElementSnapshotEntry;
use snapshot_watch::{diff, DomChangeReport, StabilizationWaiter, StabilizeConfig, WatchError};

/// Observes what an action did to the page.
pub struct ActionVerifier {
    waiter: StabilizationWaiter,
    bridge: Arc<dyn PageBridge>,
}

impl ActionVerifier {
    pub fn new(bridge: Arc<dyn PageBridge>, config: StabilizeConfig) -> Self {
        Self {
            waiter: StabilizationWaiter::new(bridge.clone(), config),
            bridge,
        }
    }

    /// Snapshot taken before the action dispatches; `None` when the bridge
    /// cannot serve one, in which case the diff degrades to added-only.
    pub async fn capture_baseline(&self) -> Option<Vec<ElementSnapshotEntry>> {
        match self.bridge.interactive_snapshot().await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(error = %err, "baseline snapshot unavailable");
                None
            }
        }
    }

    /// Wait for the page to settle, then report what changed relative to
    /// the baseline.
    pub async fn observe(
        &self,
        baseline: Option<Vec<ElementSnapshotEntry>>,
    ) -> Result<DomChangeReport, WatchError> {
        let outcome = self
            .waiter
            .wait_for_stabilization(baseline.clone())
            .await?;

        let before = baseline.unwrap_or_default();
        let changes = diff(&before, &outcome.final_snapshot);
        let report =
            DomChangeReport::from_diff(changes, outcome.stabilization_time, outcome.timed_out);
        debug!(
            mutations = report.mutation_count,
            dropdown = report.dropdown_detected,
            timed_out = report.timed_out,
            "post-action verification complete"
        );
        Ok(report)
    }
}
