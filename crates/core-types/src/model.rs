//! Element references, recovery signals and snapshot entries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Point;

/// Number of text characters that participate in a snapshot key.
pub const SNAPSHOT_KEY_TEXT_LEN: usize = 20;

/// The agent's reference to an element, valid only within the snapshot it
/// came from. Once the page may have mutated, the index must not be reused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalElementRef {
    /// Index assigned during page annotation, unique within one turn.
    pub index: u32,

    /// Optional CSS selector path recorded alongside the index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector_path: Option<String>,
}

impl LogicalElementRef {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            selector_path: None,
        }
    }

    pub fn with_selector_path(mut self, path: impl Into<String>) -> Self {
        self.selector_path = Some(path.into());
        self
    }
}

/// Identity signals captured at snapshot time, used to re-find an element
/// after its index has gone stale. Derived once per element, immutable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryInfo {
    /// Accessible name or visible description.
    pub name: Option<String>,

    /// ARIA role, explicit or tag-implied.
    pub role: Option<String>,

    /// Center of the element's bounding box at snapshot time.
    pub coordinates: Option<Point>,

    /// Whether the element was recognizably interactive.
    pub interactive: bool,
}

/// One interactive element as seen by the page-side extractor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshotEntry {
    /// DOM id attribute, if any.
    pub id: Option<String>,

    /// Upper-cased tag name (DIV, BUTTON, ...).
    pub tag_name: String,

    /// ARIA role, explicit or tag-implied.
    pub role: Option<String>,

    /// Accessible name.
    pub name: Option<String>,

    /// Visible text content.
    pub text: Option<String>,

    /// Whether the extractor classified this element as interactive.
    pub interactive: bool,

    /// Synthetic target with only screen coordinates, no DOM backing.
    pub is_virtual: bool,

    /// Screen coordinates for virtual elements.
    pub virtual_coordinates: Option<Point>,
}

impl ElementSnapshotEntry {
    /// Stable map key: the DOM id when present, otherwise tag plus a
    /// truncated text prefix. A snapshot maps each key to one entry.
    pub fn snapshot_key(&self) -> String {
        if let Some(id) = self.id.as_deref().filter(|s| !s.is_empty()) {
            return id.to_string();
        }
        let text = self.text.as_deref().unwrap_or("");
        format!("{}:{}", self.tag_name, truncate_chars(text, SNAPSHOT_KEY_TEXT_LEN))
    }

    /// The `(tag, role, text prefix)` triple used by the novelty heuristic.
    pub fn identity_triple(&self) -> (String, String, String) {
        (
            self.tag_name.clone(),
            self.role.clone().unwrap_or_default(),
            truncate_chars(self.text.as_deref().unwrap_or(""), SNAPSHOT_KEY_TEXT_LEN),
        )
    }

    pub fn has_text(&self) -> bool {
        self.text
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Truncate on a character boundary; byte slicing would panic on multi-byte
/// text.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Everything the external DOM-extraction step produces for one agent turn.
///
/// Consumed immediately by the resolver and executor; never persisted past
/// the turn.
#[derive(Clone, Debug, Default)]
pub struct TurnSnapshot {
    /// Interactive elements keyed by their annotation index.
    pub entries: HashMap<u32, ElementSnapshotEntry>,

    /// Recovery signals keyed by annotation index.
    pub recovery: HashMap<u32, RecoveryInfo>,

    /// Accessibility-tree index to backend DOM node id mapping, when the
    /// extractor had an accessibility pass available.
    pub ax_backend_nodes: Option<HashMap<u32, i64>>,
}

impl TurnSnapshot {
    pub fn entry(&self, index: u32) -> Option<&ElementSnapshotEntry> {
        self.entries.get(&index)
    }

    pub fn recovery(&self, index: u32) -> Option<&RecoveryInfo> {
        self.recovery.get(&index)
    }

    pub fn ax_backend_node(&self, index: u32) -> Option<i64> {
        self.ax_backend_nodes
            .as_ref()
            .and_then(|m| m.get(&index))
            .copied()
    }
}

/// A live, actionable element produced by resolution.
///
/// At least one of the locators is set; virtual elements carry only a point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Backend DOM node id from the debugging protocol, stable across
    /// re-renders that keep the node alive.
    pub backend_node_id: Option<i64>,

    /// CSS selector that uniquely matched the element.
    pub selector: Option<String>,

    /// DOM id attribute, when known.
    pub element_id: Option<String>,

    /// Screen point for virtual elements with no DOM backing.
    pub virtual_point: Option<Point>,
}

impl ElementHandle {
    pub fn from_backend_node(id: i64) -> Self {
        Self {
            backend_node_id: Some(id),
            ..Default::default()
        }
    }

    pub fn from_selector(selector: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Default::default()
        }
    }

    pub fn virtual_at(point: Point) -> Self {
        Self {
            virtual_point: Some(point),
            ..Default::default()
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_point.is_some() && self.backend_node_id.is_none() && self.selector.is_none()
    }
}

/// How a ghost match re-identified the element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMatchMethod {
    Text,
    RoleName,
    Coordinates,
    Combined,
}

impl GhostMatchMethod {
    pub fn name(&self) -> &'static str {
        match self {
            GhostMatchMethod::Text => "text",
            GhostMatchMethod::RoleName => "role_name",
            GhostMatchMethod::Coordinates => "coordinates",
            GhostMatchMethod::Combined => "combined",
        }
    }
}

/// Outcome of a successful fuzzy recovery.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GhostMatchResult {
    /// Handle to the re-identified element.
    pub handle: ElementHandle,

    /// DOM id of the new element, if it has one.
    pub new_element_id: Option<String>,

    /// Score in [0, 1]; accepted only at or above the configured minimum.
    pub confidence: f64,

    /// Which signals drove the match.
    pub match_method: GhostMatchMethod,
}
