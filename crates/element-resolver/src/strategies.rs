//! Direct resolution strategies, tried in fallback order:
//! 1. Accessibility map - stable backend node id recorded per turn
//! 2. Stable attribute - persistent annotation attribute query
//! 3. Selector id - legacy unique-selector lookup via the page bridge

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use page_bridge::{BridgeErrorKind, PageBridge, ProtocolBridge, RetryPolicy};
use pagegrip_core_types::{ElementHandle, LogicalElementRef, TurnSnapshot};

use crate::errors::ResolveError;

/// Attribute stamped onto every annotated element at page-annotation time.
/// Durable across re-renders that do not destroy the node.
pub const STABLE_ID_ATTR: &str = "data-grip-index";

/// Which tier produced a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StrategyKind {
    AxMap,
    StableAttribute,
    SelectorId,
    GhostMatch,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::AxMap => "ax-map",
            StrategyKind::StableAttribute => "stable-attr",
            StrategyKind::SelectorId => "selector-id",
            StrategyKind::GhostMatch => "ghost-match",
        }
    }
}

/// One direct lookup tier. `Ok(None)` means a clean miss; the chain moves
/// on. Errors are absorbed into the failure accumulator.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    async fn resolve(
        &self,
        element_ref: &LogicalElementRef,
        turn: &TurnSnapshot,
    ) -> Result<Option<ElementHandle>, ResolveError>;

    fn kind(&self) -> StrategyKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Tier 1: accessibility-tree-to-DOM mapping captured with the snapshot.
/// Fast path; a clean miss when the extractor had no accessibility pass.
pub struct AxMapStrategy;

#[async_trait]
impl ResolveStrategy for AxMapStrategy {
    async fn resolve(
        &self,
        element_ref: &LogicalElementRef,
        turn: &TurnSnapshot,
    ) -> Result<Option<ElementHandle>, ResolveError> {
        let Some(backend_node_id) = turn.ax_backend_node(element_ref.index) else {
            return Ok(None);
        };

        debug!(index = element_ref.index, backend_node_id, "ax map hit");
        let mut handle = ElementHandle::from_backend_node(backend_node_id);
        handle.element_id = turn
            .entry(element_ref.index)
            .and_then(|e| e.id.clone())
            .filter(|id| !id.is_empty());
        Ok(Some(handle))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::AxMap
    }
}

/// Tier 2: query for the persistent annotation attribute.
pub struct StableAttributeStrategy {
    protocol: Arc<dyn ProtocolBridge>,
}

impl StableAttributeStrategy {
    pub fn new(protocol: Arc<dyn ProtocolBridge>) -> Self {
        Self { protocol }
    }
}

#[async_trait]
impl ResolveStrategy for StableAttributeStrategy {
    async fn resolve(
        &self,
        element_ref: &LogicalElementRef,
        _turn: &TurnSnapshot,
    ) -> Result<Option<ElementHandle>, ResolveError> {
        let selector = format!("[{}=\"{}\"]", STABLE_ID_ATTR, element_ref.index);
        resolve_selector(self.protocol.as_ref(), &selector).await
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::StableAttribute
    }
}

/// Tier 3: ask the page bridge for the unique selector id of the index.
/// The bridge may be mid-initialization, so the lookup runs under the
/// shared retry policy; a recorded selector path is the last resort.
pub struct SelectorIdStrategy {
    protocol: Arc<dyn ProtocolBridge>,
    page: Arc<dyn PageBridge>,
    retry: RetryPolicy,
}

impl SelectorIdStrategy {
    pub fn new(
        protocol: Arc<dyn ProtocolBridge>,
        page: Arc<dyn PageBridge>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            protocol,
            page,
            retry,
        }
    }
}

#[async_trait]
impl ResolveStrategy for SelectorIdStrategy {
    async fn resolve(
        &self,
        element_ref: &LogicalElementRef,
        _turn: &TurnSnapshot,
    ) -> Result<Option<ElementHandle>, ResolveError> {
        let index = element_ref.index;
        let lookup = self
            .retry
            .run("unique-selector-id", || async move {
                self.page.unique_selector_id(index).await
            })
            .await;

        let selector = match lookup {
            Ok(selector) if !selector.is_empty() => selector,
            Ok(_) => return Ok(None),
            Err(err) if err.kind == BridgeErrorKind::BridgeUnavailable => {
                // Bridge stayed down; a recorded selector path still lets
                // the protocol side do the lookup.
                match element_ref.selector_path.clone() {
                    Some(path) if !path.is_empty() => {
                        debug!(index, "bridge unavailable; using recorded selector path");
                        path
                    }
                    _ => return Err(ResolveError::BridgeUnavailable(err.to_string())),
                }
            }
            Err(err) => {
                return Err(ResolveError::StrategyFailed {
                    strategy: self.name().to_string(),
                    reason: err.to_string(),
                })
            }
        };

        resolve_selector(self.protocol.as_ref(), &selector).await
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::SelectorId
    }
}

/// Resolve a CSS selector to a live handle via the debugging protocol.
/// Also used downstream to upgrade selector-only handles (for example a
/// ghost-match candidate reported without a backend node id).
pub async fn resolve_selector(
    protocol: &dyn ProtocolBridge,
    selector: &str,
) -> Result<Option<ElementHandle>, ResolveError> {
    let document = protocol
        .send("DOM.getDocument", json!({ "depth": 0 }))
        .await
        .map_err(|err| ResolveError::Protocol(err.to_string()))?;
    let root_id = document
        .pointer("/root/nodeId")
        .and_then(Value::as_i64)
        .ok_or_else(|| ResolveError::Protocol("DOM.getDocument returned no root".to_string()))?;

    let found = protocol
        .send(
            "DOM.querySelector",
            json!({ "nodeId": root_id, "selector": selector }),
        )
        .await
        .map_err(|err| ResolveError::Protocol(err.to_string()))?;
    let node_id = found.get("nodeId").and_then(Value::as_i64).unwrap_or(0);
    if node_id == 0 {
        return Ok(None);
    }

    let described = protocol
        .send("DOM.describeNode", json!({ "nodeId": node_id }))
        .await
        .map_err(|err| ResolveError::Protocol(err.to_string()))?;
    let backend_node_id = described.pointer("/node/backendNodeId").and_then(Value::as_i64);

    let mut handle = ElementHandle::from_selector(selector);
    handle.backend_node_id = backend_node_id;
    Ok(Some(handle))
}
