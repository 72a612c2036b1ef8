//! The two abstract capabilities the action core is wired against.
//!
//! `ProtocolBridge` carries remote-debugging commands (DOM and geometry
//! queries, input dispatch, attachment lifecycle). `PageBridge` runs small
//! structured queries inside the live page and returns structured results;
//! the core never emits raw script text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pagegrip_core_types::{ElementHandle, ElementSnapshotEntry, Rect};

use crate::errors::BridgeError;

/// Remote-debugging transport capability.
///
/// One attachment per page/tab; it is an exclusive resource and contention
/// is reported as `BridgeErrorKind::AlreadyAttached`.
#[async_trait]
pub trait ProtocolBridge: Send + Sync {
    /// Issue a protocol command and return the structured response.
    async fn send(&self, method: &str, params: Value) -> Result<Value, BridgeError>;

    /// Acquire the exclusive debugger attachment.
    async fn attach(&self) -> Result<(), BridgeError>;

    /// Release the attachment. Must succeed even after cancellation.
    async fn detach(&self) -> Result<(), BridgeError>;
}

/// Structured query for ghost-match candidate enumeration.
///
/// The page side enumerates visible, non-hidden elements and reports the
/// identity signals the scoring engine needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateQuery {
    /// Restrict enumeration to elements with these roles (explicit or
    /// tag-implied). Empty means no role restriction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    /// Only return recognizably interactive elements.
    pub interactive_only: bool,

    /// Upper bound on returned candidates, in document order.
    pub limit: usize,
}

impl CandidateQuery {
    pub fn interactive(limit: usize) -> Self {
        Self {
            roles: Vec::new(),
            interactive_only: true,
            limit,
        }
    }
}

/// One live element returned by a candidate query, in document order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateElement {
    /// DOM id attribute, if any.
    pub element_id: Option<String>,

    /// Backend DOM node id, when the bridge can supply one.
    pub backend_node_id: Option<i64>,

    /// CSS selector that uniquely identifies the candidate.
    pub selector: Option<String>,

    /// Upper-cased tag name.
    pub tag_name: String,

    /// Explicit role attribute, if any.
    pub role: Option<String>,

    /// Visible text content.
    pub text: Option<String>,

    /// aria-label attribute.
    pub aria_label: Option<String>,

    /// name attribute.
    pub name_attr: Option<String>,

    /// title attribute.
    pub title: Option<String>,

    /// placeholder attribute.
    pub placeholder: Option<String>,

    /// Current bounding box.
    pub rect: Rect,

    /// Whether the element is recognizably interactive.
    pub interactive: bool,
}

impl CandidateElement {
    /// Build a handle for this candidate, preferring the stable backend
    /// node id.
    pub fn to_handle(&self) -> ElementHandle {
        ElementHandle {
            backend_node_id: self.backend_node_id,
            selector: self.selector.clone(),
            element_id: self.element_id.clone(),
            virtual_point: None,
        }
    }
}

/// Result of hit-testing a point against an intended target.
///
/// The relationship check runs page-side where containment is cheap; the
/// core only needs to know whether the hit element is the target (or one of
/// its ancestors/descendants) versus an unrelated overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HitTestResult {
    /// The element at the point is the target itself.
    Target,

    /// The element at the point contains the target or is contained by it.
    TargetRelative,

    /// An unrelated element covers the point.
    Obstructed {
        tag_name: String,
        element_id: Option<String>,
    },

    /// Nothing hit-testable at the point.
    Nothing,
}

impl HitTestResult {
    pub fn is_target(&self) -> bool {
        matches!(self, HitTestResult::Target | HitTestResult::TargetRelative)
    }
}

/// Cheap identity probe of the current document, used for side-effect
/// detection around a click.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentProbe {
    /// Current URL.
    pub url: String,

    /// First portion of the document body text; the core hashes it.
    pub body_prefix: String,
}

/// Page-side query capability provided by the content-execution layer.
///
/// May be transiently unavailable (mid-initialization); callers retry with
/// backoff and degrade gracefully where a best-effort answer is acceptable.
#[async_trait]
pub trait PageBridge: Send + Sync {
    /// Snapshot of all interactive elements currently in the page.
    async fn interactive_snapshot(&self) -> Result<Vec<ElementSnapshotEntry>, BridgeError>;

    /// Unique CSS selector id corresponding to an annotation index.
    async fn unique_selector_id(&self, index: u32) -> Result<String, BridgeError>;

    /// Whether the page currently has no in-flight network activity.
    async fn network_idle(&self) -> Result<bool, BridgeError>;

    /// Cosmetic ripple at the interaction point. Best effort; failures are
    /// swallowed by callers.
    async fn visual_feedback(&self, x: f64, y: f64) -> Result<(), BridgeError>;

    /// Enumerate live candidates for fuzzy recovery, in document order.
    async fn query_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateElement>, BridgeError>;

    /// Bounding rect with page-side fallback chain: the element itself, then
    /// its first visible child, then the nearest visible ancestor. `None`
    /// when no geometry can be established.
    async fn element_rect(&self, handle: &ElementHandle) -> Result<Option<Rect>, BridgeError>;

    /// Scroll the nearest scrollable ancestor so the element is centered,
    /// falling back to whole-page scroll-into-view. Returns false when the
    /// element could not be found.
    async fn scroll_into_view(&self, handle: &ElementHandle) -> Result<bool, BridgeError>;

    /// Hit-test a point against the intended target.
    async fn hit_test(
        &self,
        x: f64,
        y: f64,
        target: &ElementHandle,
    ) -> Result<HitTestResult, BridgeError>;

    /// Probe the current document identity (URL plus body text prefix).
    async fn document_probe(&self) -> Result<DocumentProbe, BridgeError>;

    /// Fire input/change events and blur on the element so framework
    /// validation runs after a set-value.
    async fn commit_input(&self, handle: &ElementHandle) -> Result<(), BridgeError>;

    /// Force visibility and relayout on an element whose box model came back
    /// degenerate. Best effort.
    async fn force_layout(&self, handle: &ElementHandle) -> Result<(), BridgeError>;
}
