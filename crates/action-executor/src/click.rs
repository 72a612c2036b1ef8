//! Click pipeline.
//!
//! Resolution happens-before dispatch, which happens-before verification;
//! the obstruction gate sits strictly before any mouse event leaves the
//! core, and the hydration-gap check retries a silent click exactly once.

use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use pagegrip_core_types::{ElementHandle, LogicalElementRef, Point, TurnSnapshot};

use crate::errors::ExecError;
use crate::executor::{ActionExecutor, ExecCheckpoint};
use crate::geometry;
use crate::input;
use crate::state::PageFingerprint;

/// What a completed click did, for result enrichment.
#[derive(Clone, Debug)]
pub struct ClickReport {
    /// How the target was resolved; `None` for virtual elements.
    pub resolution: Option<element_resolver::ResolutionResult>,

    /// Total mouse down/up pairs dispatched (1, or 2 after a hydration
    /// retry).
    pub dispatched_clicks: u32,

    /// Whether the click went to a coordinate-only virtual element.
    pub virtual_target: bool,
}

pub async fn execute_click(
    executor: &ActionExecutor,
    checkpoint: &ExecCheckpoint<'_>,
    element_ref: &LogicalElementRef,
    turn: &TurnSnapshot,
) -> Result<ClickReport, ExecError> {
    checkpoint.check("click:start")?;

    // Virtual elements have no DOM backing; dispatch at the recorded
    // coordinates and skip every DOM step.
    if let Some(point) = virtual_target_point(element_ref, turn) {
        debug!(index = element_ref.index, "clicking virtual element");
        notify_feedback(executor, point).await;
        input::dispatch_click(executor.protocol(), point).await?;
        return Ok(ClickReport {
            resolution: None,
            dispatched_clicks: 1,
            virtual_target: true,
        });
    }

    let recovery = turn.recovery(element_ref.index);
    let resolution = executor
        .resolver()
        .resolve(element_ref, recovery, turn)
        .await?;
    checkpoint.check("click:resolved")?;

    scroll_to(executor, &resolution.handle).await;

    let point = geometry::element_center(
        executor.protocol(),
        executor.page(),
        &resolution.handle,
        executor.config(),
    )
    .await?;

    // Obstruction gate: nothing is dispatched when an overlay covers the
    // point.
    check_obstruction(executor, point, &resolution.handle).await?;
    checkpoint.check("click:pre-dispatch")?;

    let before = match PageFingerprint::capture(executor.page()).await {
        Ok(fp) => Some(fp),
        Err(err) => {
            warn!(error = %err, "before-state capture failed; skipping side-effect check");
            None
        }
    };

    notify_feedback(executor, point).await;
    input::dispatch_click(executor.protocol(), point).await?;
    let mut dispatched = 1;

    if let Some(before) = before {
        let settle = Duration::from_millis(executor.config().settle_delay_ms);
        sleep(settle).await;

        // A probe failure here degrades like the before-probe did: the click
        // was dispatched, so an unreadable after-state must not fail it.
        match PageFingerprint::capture(executor.page()).await {
            Ok(after) if after == before => {
                // Hydration gap: the element may have just become
                // interactive. Exactly one retry.
                debug!(index = element_ref.index, "no observable change; retrying click once");
                input::dispatch_click(executor.protocol(), point).await?;
                dispatched += 1;
                sleep(settle).await;
                match PageFingerprint::capture(executor.page()).await {
                    Ok(after) if after == before => {
                        return Err(ExecError::NoSideEffect(format!(
                            "url and document hash unchanged after {} dispatches",
                            dispatched
                        )));
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "after-state capture failed; skipping side-effect check")
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "after-state capture failed; skipping side-effect check")
            }
        }
    }

    info!(
        index = element_ref.index,
        dispatched, "click completed with observable change"
    );
    Ok(ClickReport {
        resolution: Some(resolution),
        dispatched_clicks: dispatched,
        virtual_target: false,
    })
}

fn virtual_target_point(element_ref: &LogicalElementRef, turn: &TurnSnapshot) -> Option<Point> {
    let entry = turn.entry(element_ref.index)?;
    if entry.is_virtual {
        entry.virtual_coordinates
    } else {
        None
    }
}

/// Scroll so the target is centered; the page side walks scrollable
/// ancestors and falls back to whole-page scroll-into-view. A protocol
/// scroll is the last resort when the page bridge is down.
async fn scroll_to(executor: &ActionExecutor, handle: &ElementHandle) {
    match executor.page().scroll_into_view(handle).await {
        Ok(true) => return,
        Ok(false) => debug!("page-side scroll could not find target"),
        Err(err) => debug!(error = %err, "page-side scroll failed"),
    }

    if let Some(backend_node_id) = handle.backend_node_id {
        if let Err(err) = executor
            .protocol()
            .send(
                "DOM.scrollIntoViewIfNeeded",
                json!({ "backendNodeId": backend_node_id }),
            )
            .await
        {
            debug!(error = %err, "protocol scroll fallback failed");
        }
    }
}

async fn check_obstruction(
    executor: &ActionExecutor,
    point: Point,
    handle: &ElementHandle,
) -> Result<(), ExecError> {
    match executor.page().hit_test(point.x, point.y, handle).await {
        Ok(result) if result.is_target() => Ok(()),
        Ok(page_bridge::HitTestResult::Obstructed {
            tag_name,
            element_id,
        }) => Err(ExecError::Obstructed(format!(
            "point ({:.0},{:.0}) is covered by <{}{}>",
            point.x,
            point.y,
            tag_name,
            element_id
                .map(|id| format!(" id={}", id))
                .unwrap_or_default()
        ))),
        Ok(page_bridge::HitTestResult::Nothing) => Err(ExecError::Obstructed(format!(
            "nothing hit-testable at ({:.0},{:.0})",
            point.x, point.y
        ))),
        Ok(_) => Ok(()),
        Err(err) => {
            // The gate is best effort when the bridge itself is down;
            // blocking every click on an unrelated subsystem is worse than
            // skipping the check.
            warn!(error = %err, "hit test unavailable; proceeding without obstruction gate");
            Ok(())
        }
    }
}

/// Cosmetic ripple at the interaction point. Failures are swallowed.
async fn notify_feedback(executor: &ActionExecutor, point: Point) {
    if let Err(err) = executor.page().visual_feedback(point.x, point.y).await {
        debug!(error = %err, "visual feedback failed");
    }
}
