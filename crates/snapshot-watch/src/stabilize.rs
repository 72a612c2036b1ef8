//! Adaptive stabilization waiting.
//!
//! Polls interactive-element snapshots until the page stops mutating and the
//! network goes quiet, or a hard ceiling elapses. The state machine is
//! INIT -> (sleep min_wait) -> POLL -> STABLE | TIMEOUT.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use page_bridge::PageBridge;
use pagegrip_core_types::ElementSnapshotEntry;

use crate::differ;
use crate::errors::WatchError;

/// Consecutive snapshot failures tolerated before giving up.
const MAX_SNAPSHOT_FAILURES: u32 = 3;

/// Timing knobs for stabilization waiting. Callers widen these when a
/// dropdown or menu open is anticipated.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StabilizeConfig {
    /// Unconditional settle sleep before the first poll.
    pub min_wait_ms: u64,

    /// Hard ceiling on the whole wait.
    pub max_wait_ms: u64,

    /// Quiet period required before the page counts as stable.
    pub stability_threshold_ms: u64,

    /// Interval between polls.
    pub poll_interval_ms: u64,
}

impl Default for StabilizeConfig {
    fn default() -> Self {
        Self {
            min_wait_ms: 500,
            max_wait_ms: 10_000,
            stability_threshold_ms: 300,
            poll_interval_ms: 100,
        }
    }
}

impl StabilizeConfig {
    /// Longer windows for actions expected to open a menu or dropdown.
    pub fn for_menu_open() -> Self {
        Self {
            min_wait_ms: 700,
            max_wait_ms: 15_000,
            stability_threshold_ms: 500,
            poll_interval_ms: 100,
        }
    }
}

/// Result of one stabilization wait.
#[derive(Clone, Debug)]
pub struct StabilizationOutcome {
    /// Elapsed time until stability, or the ceiling when timed out.
    pub stabilization_time: Duration,

    /// Whether the ceiling elapsed before the page settled.
    pub timed_out: bool,

    /// The last snapshot taken; callers diff it against their baseline.
    pub final_snapshot: Vec<ElementSnapshotEntry>,
}

/// Polls snapshots plus the network-idle signal until the page settles.
pub struct StabilizationWaiter {
    bridge: Arc<dyn PageBridge>,
    config: StabilizeConfig,
}

impl StabilizationWaiter {
    pub fn new(bridge: Arc<dyn PageBridge>, config: StabilizeConfig) -> Self {
        Self { bridge, config }
    }

    pub fn config(&self) -> &StabilizeConfig {
        &self.config
    }

    /// Wait until the page stops mutating.
    ///
    /// `baseline` seeds the first comparison when the caller already holds a
    /// pre-action snapshot; otherwise the first poll establishes it.
    pub async fn wait_for_stabilization(
        &self,
        baseline: Option<Vec<ElementSnapshotEntry>>,
    ) -> Result<StabilizationOutcome, WatchError> {
        let start = Instant::now();
        let max_wait = Duration::from_millis(self.config.max_wait_ms);
        let threshold = Duration::from_millis(self.config.stability_threshold_ms);
        let poll = Duration::from_millis(self.config.poll_interval_ms);

        sleep(Duration::from_millis(self.config.min_wait_ms)).await;

        let mut previous = baseline;
        let mut last_change = Instant::now();
        let mut failures: u32 = 0;

        loop {
            if start.elapsed() >= max_wait {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "stabilization timed out");
                return Ok(StabilizationOutcome {
                    stabilization_time: max_wait,
                    timed_out: true,
                    final_snapshot: previous.unwrap_or_default(),
                });
            }

            let snapshot = match self.bridge.interactive_snapshot().await {
                Ok(snapshot) => {
                    failures = 0;
                    snapshot
                }
                Err(err) => {
                    failures += 1;
                    warn!(error = %err, failures, "snapshot poll failed");
                    if failures >= MAX_SNAPSHOT_FAILURES {
                        return Err(WatchError::SnapshotUnavailable(err.to_string()));
                    }
                    sleep(poll).await;
                    continue;
                }
            };

            let changed = match &previous {
                Some(prev) => !differ::diff(prev, &snapshot).is_empty(),
                None => true,
            };

            if changed {
                last_change = Instant::now();
            }

            if !changed && last_change.elapsed() >= threshold && self.network_is_idle().await {
                let elapsed = start.elapsed();
                debug!(
                    stabilization_ms = elapsed.as_millis() as u64,
                    "page stabilized"
                );
                return Ok(StabilizationOutcome {
                    stabilization_time: elapsed,
                    timed_out: false,
                    final_snapshot: snapshot,
                });
            }

            previous = Some(snapshot);
            sleep(poll).await;
        }
    }

    /// Unknown network state counts as idle rather than blocking on an
    /// unrelated subsystem.
    async fn network_is_idle(&self) -> bool {
        match self.bridge.network_idle().await {
            Ok(idle) => idle,
            Err(err) => {
                warn!(error = %err, "network idle probe failed; treating as idle");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use page_bridge::{
        BridgeError, CandidateElement, CandidateQuery, DocumentProbe, HitTestResult, PageBridge,
    };
    use pagegrip_core_types::{ElementHandle, Rect};
    use std::sync::Mutex;

    /// Scripted bridge: serves a fixed sequence of snapshots, repeating the
    /// last one once the script runs out.
    struct ScriptedBridge {
        snapshots: Mutex<Vec<Vec<ElementSnapshotEntry>>>,
        idle: bool,
    }

    impl ScriptedBridge {
        fn new(snapshots: Vec<Vec<ElementSnapshotEntry>>) -> Self {
            Self {
                snapshots: Mutex::new(snapshots),
                idle: true,
            }
        }
    }

    fn entry(id: &str) -> ElementSnapshotEntry {
        ElementSnapshotEntry {
            id: Some(id.to_string()),
            tag_name: "BUTTON".to_string(),
            interactive: true,
            ..Default::default()
        }
    }

    #[async_trait]
    impl PageBridge for ScriptedBridge {
        async fn interactive_snapshot(&self) -> Result<Vec<ElementSnapshotEntry>, BridgeError> {
            let mut snapshots = self.snapshots.lock().unwrap();
            if snapshots.len() > 1 {
                Ok(snapshots.remove(0))
            } else {
                Ok(snapshots.first().cloned().unwrap_or_default())
            }
        }

        async fn unique_selector_id(&self, _index: u32) -> Result<String, BridgeError> {
            unimplemented!("not used in stabilization tests")
        }

        async fn network_idle(&self) -> Result<bool, BridgeError> {
            if self.idle {
                Ok(true)
            } else {
                Err(BridgeError::unavailable("network tap down"))
            }
        }

        async fn visual_feedback(&self, _x: f64, _y: f64) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn query_candidates(
            &self,
            _query: &CandidateQuery,
        ) -> Result<Vec<CandidateElement>, BridgeError> {
            Ok(Vec::new())
        }

        async fn element_rect(&self, _handle: &ElementHandle) -> Result<Option<Rect>, BridgeError> {
            Ok(None)
        }

        async fn scroll_into_view(&self, _handle: &ElementHandle) -> Result<bool, BridgeError> {
            Ok(true)
        }

        async fn hit_test(
            &self,
            _x: f64,
            _y: f64,
            _target: &ElementHandle,
        ) -> Result<HitTestResult, BridgeError> {
            Ok(HitTestResult::Target)
        }

        async fn document_probe(&self) -> Result<DocumentProbe, BridgeError> {
            Ok(DocumentProbe::default())
        }

        async fn commit_input(&self, _handle: &ElementHandle) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn force_layout(&self, _handle: &ElementHandle) -> Result<(), BridgeError> {
            Ok(())
        }
    }

    fn quick_config() -> StabilizeConfig {
        StabilizeConfig {
            min_wait_ms: 50,
            max_wait_ms: 2_000,
            stability_threshold_ms: 300,
            poll_interval_ms: 100,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn settles_after_changes_stop() {
        // Two changing snapshots, then steady state.
        let bridge = Arc::new(ScriptedBridge::new(vec![
            vec![entry("a")],
            vec![entry("a"), entry("b")],
            vec![entry("a"), entry("b"), entry("c")],
            vec![entry("a"), entry("b"), entry("c")],
        ]));
        let waiter = StabilizationWaiter::new(bridge, quick_config());

        let outcome = waiter
            .wait_for_stabilization(Some(vec![entry("a")]))
            .await
            .unwrap();
        assert!(!outcome.timed_out);
        // Changes stop ~250ms in (min_wait + two changed polls); stability
        // requires a further 300ms quiet period.
        let ms = outcome.stabilization_time.as_millis() as u64;
        assert!((450..=900).contains(&ms), "stabilized at {}ms", ms);
        assert_eq!(outcome.final_snapshot.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_changes_never_stop() {
        // Every poll produces a brand new element.
        let churn: Vec<Vec<ElementSnapshotEntry>> = (0..100)
            .map(|i| vec![entry(&format!("gen-{}", i))])
            .collect();
        let bridge = Arc::new(ScriptedBridge::new(churn));
        let waiter = StabilizationWaiter::new(bridge, quick_config());

        let outcome = waiter.wait_for_stabilization(None).await.unwrap();
        assert!(outcome.timed_out);
        assert_eq!(outcome.stabilization_time, Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn network_probe_failure_fails_open() {
        let mut bridge = ScriptedBridge::new(vec![vec![entry("a")], vec![entry("a")]]);
        bridge.idle = false;
        let waiter = StabilizationWaiter::new(Arc::new(bridge), quick_config());

        let outcome = waiter
            .wait_for_stabilization(Some(vec![entry("a")]))
            .await
            .unwrap();
        assert!(!outcome.timed_out);
    }
}
