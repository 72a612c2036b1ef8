//! Set-value pipeline.
//!
//! Values are typed as real key events rather than poked into the DOM, so
//! per-keystroke handlers (masks, autocompletes, validators) observe every
//! character. Existing content is cleared with select-all plus delete, and
//! a page-side commit fires the input/change/blur sequence frameworks
//! listen for.

use std::time::Duration;

use rand::Rng;
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, info};

use element_resolver::ResolutionResult;
use pagegrip_core_types::{LogicalElementRef, TurnSnapshot};

use crate::errors::ExecError;
use crate::executor::{ActionExecutor, ExecCheckpoint};
use crate::input::{self, MODIFIER_CTRL};

/// What a completed set-value did, for result enrichment.
#[derive(Clone, Debug)]
pub struct SetValueReport {
    pub resolution: ResolutionResult,

    /// Characters typed (after the clear sequence).
    pub typed_chars: usize,
}

pub async fn execute_set_value(
    executor: &ActionExecutor,
    checkpoint: &ExecCheckpoint<'_>,
    element_ref: &LogicalElementRef,
    value: &str,
    turn: &TurnSnapshot,
) -> Result<SetValueReport, ExecError> {
    checkpoint.check("set-value:start")?;

    let recovery = turn.recovery(element_ref.index);
    let resolution = executor
        .resolver()
        .resolve(element_ref, recovery, turn)
        .await?;
    checkpoint.check("set-value:resolved")?;

    if let Ok(false) | Err(_) = executor.page().scroll_into_view(&resolution.handle).await {
        debug!(index = element_ref.index, "scroll before focus was best-effort only");
    }

    focus(executor, &resolution).await?;

    // Clear whatever is already in the field.
    input::dispatch_key_pair(executor.protocol(), "a", None, MODIFIER_CTRL).await?;
    input::dispatch_key_pair(executor.protocol(), "Delete", None, 0).await?;

    let (delay_min, delay_max) = (
        executor.config().key_delay_min_ms,
        executor.config().key_delay_max_ms.max(executor.config().key_delay_min_ms),
    );
    let mut typed = 0usize;
    for ch in value.chars() {
        checkpoint.check("set-value:typing")?;
        let key = ch.to_string();
        input::dispatch_key_pair(executor.protocol(), &key, Some(&key), 0).await?;
        typed += 1;

        let delay = rand::thread_rng().gen_range(delay_min..=delay_max);
        sleep(Duration::from_millis(delay)).await;
    }

    // Fire input/change/blur so reactive frameworks pick up the new value.
    executor.page().commit_input(&resolution.handle).await?;

    info!(
        index = element_ref.index,
        chars = typed,
        strategy = resolution.strategy.name(),
        "value set"
    );
    Ok(SetValueReport {
        resolution,
        typed_chars: typed,
    })
}

/// Focus the target. Selector-only handles (a ghost candidate reported
/// without a backend node id) are upgraded through a selector lookup first.
async fn focus(executor: &ActionExecutor, resolution: &ResolutionResult) -> Result<(), ExecError> {
    let handle = &resolution.handle;
    let backend_node_id = match handle.backend_node_id {
        Some(id) => Some(id),
        None => match handle.selector.as_deref() {
            Some(selector) => element_resolver::resolve_selector(executor.protocol(), selector)
                .await?
                .and_then(|h| h.backend_node_id),
            None => None,
        },
    };

    match backend_node_id {
        Some(backend_node_id) => {
            executor
                .protocol()
                .send("DOM.focus", json!({ "backendNodeId": backend_node_id }))
                .await?;
            Ok(())
        }
        None => Err(ExecError::NotFound(
            "resolved handle has no focusable node".to_string(),
        )),
    }
}
