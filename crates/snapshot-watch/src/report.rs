//! Change-report building and dropdown classification.
//!
//! The report serves two consumers: action verification (did anything
//! happen) and prompt enrichment for the next agent turn. The multi-line
//! summary is reproducible from the report fields alone.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use pagegrip_core_types::ElementSnapshotEntry;

use crate::differ::SnapshotDiff;

/// Roles that mark an element as a menu/dropdown entry.
const MENU_ROLES: [&str; 4] = ["menuitem", "option", "menuitemcheckbox", "menuitemradio"];

/// Tags that heuristically form list-like menus when they appear together.
const MENU_TAGS: [&str; 3] = ["LI", "A", "BUTTON"];

/// One entry of a detected dropdown/menu.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropdownItem {
    pub text: String,
    pub role: Option<String>,
    pub element_id: Option<String>,
}

/// What changed on the page after an action.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DomChangeReport {
    pub added_elements: Vec<ElementSnapshotEntry>,
    pub removed_elements: Vec<ElementSnapshotEntry>,

    /// Always `added + removed`.
    pub mutation_count: usize,

    /// How long the page took to settle, in milliseconds.
    pub stabilization_time_ms: u64,

    /// Whether the stabilization wait hit its ceiling.
    pub timed_out: bool,

    pub dropdown_detected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropdown_items: Option<Vec<DropdownItem>>,
}

impl DomChangeReport {
    /// Build a report from a diff and the observed stabilization time.
    pub fn from_diff(diff: SnapshotDiff, stabilization_time: Duration, timed_out: bool) -> Self {
        let dropdown_items = classify_dropdown(&diff.added);
        let mutation_count = diff.mutation_count();
        Self {
            added_elements: diff.added,
            removed_elements: diff.removed,
            mutation_count,
            stabilization_time_ms: stabilization_time.as_millis() as u64,
            timed_out,
            dropdown_detected: dropdown_items.is_some(),
            dropdown_items,
        }
    }

    /// Human-readable multi-line summary for logging and prompt enrichment.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "DOM changes: {} added, {} removed ({} mutations), stabilized in {}ms{}",
            self.added_elements.len(),
            self.removed_elements.len(),
            self.mutation_count,
            self.stabilization_time_ms,
            if self.timed_out { " (timed out)" } else { "" },
        )];

        for entry in &self.added_elements {
            lines.push(format!("  + {}", describe(entry)));
        }
        for entry in &self.removed_elements {
            lines.push(format!("  - {}", describe(entry)));
        }

        if let Some(items) = &self.dropdown_items {
            lines.push(format!("Dropdown/menu detected with {} items:", items.len()));
            for item in items {
                lines.push(format!(
                    "  * {}{}",
                    item.text,
                    item.role
                        .as_deref()
                        .map(|r| format!(" [{}]", r))
                        .unwrap_or_default()
                ));
            }
        }

        lines.join("\n")
    }
}

fn describe(entry: &ElementSnapshotEntry) -> String {
    let mut out = entry.tag_name.clone();
    if let Some(role) = entry.role.as_deref().filter(|r| !r.is_empty()) {
        out.push_str(&format!(" role={}", role));
    }
    if let Some(text) = entry.text.as_deref().filter(|t| !t.trim().is_empty()) {
        out.push_str(&format!(" \"{}\"", pagegrip_core_types::truncate_chars(text.trim(), 40)));
    }
    out
}

/// Classify the added set as a dropdown/menu.
///
/// Rules: two or more menu-role elements; or one menu-role element with
/// text; or, heuristically, two or more interactive LI/A/BUTTON elements
/// with text appearing together.
pub fn classify_dropdown(added: &[ElementSnapshotEntry]) -> Option<Vec<DropdownItem>> {
    let is_menu_role = |entry: &ElementSnapshotEntry| {
        entry
            .role
            .as_deref()
            .map(|r| MENU_ROLES.contains(&r.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    };

    let menu_role_entries: Vec<&ElementSnapshotEntry> =
        added.iter().filter(|e| is_menu_role(e)).collect();

    let by_role = menu_role_entries.len() >= 2
        || menu_role_entries.iter().any(|e| e.has_text());

    let list_like: Vec<&ElementSnapshotEntry> = added
        .iter()
        .filter(|e| {
            e.interactive && e.has_text() && MENU_TAGS.contains(&e.tag_name.to_uppercase().as_str())
        })
        .collect();
    let by_structure = list_like.len() >= 2;

    if !by_role && !by_structure {
        return None;
    }

    let source: Vec<&ElementSnapshotEntry> = if !menu_role_entries.is_empty() {
        menu_role_entries
    } else {
        list_like
    };

    Some(
        source
            .into_iter()
            .map(|entry| DropdownItem {
                text: entry.text.clone().unwrap_or_default().trim().to_string(),
                role: entry.role.clone(),
                element_id: entry.id.clone(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::diff;

    fn menu_item(id: &str, text: &str) -> ElementSnapshotEntry {
        ElementSnapshotEntry {
            id: Some(id.to_string()),
            tag_name: "DIV".to_string(),
            role: Some("menuitem".to_string()),
            text: Some(text.to_string()),
            interactive: true,
            ..Default::default()
        }
    }

    fn plain(id: &str, tag: &str, text: &str) -> ElementSnapshotEntry {
        ElementSnapshotEntry {
            id: Some(id.to_string()),
            tag_name: tag.to_string(),
            text: Some(text.to_string()),
            interactive: true,
            ..Default::default()
        }
    }

    #[test]
    fn three_menuitems_form_a_dropdown() {
        let before: Vec<ElementSnapshotEntry> = Vec::new();
        let after = vec![
            menu_item("m1", "Open"),
            menu_item("m2", "Save"),
            menu_item("m3", "Export"),
        ];
        let report =
            DomChangeReport::from_diff(diff(&before, &after), Duration::from_millis(820), false);

        assert!(report.dropdown_detected);
        let items = report.dropdown_items.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].text, "Open");
        assert_eq!(report.mutation_count, 3);
    }

    #[test]
    fn single_menuitem_with_text_counts() {
        let items = classify_dropdown(&[menu_item("m1", "Settings")]).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn single_textless_menuitem_does_not_count() {
        let mut e = menu_item("m1", "");
        e.text = None;
        assert!(classify_dropdown(&[e]).is_none());
    }

    #[test]
    fn list_heuristic_needs_two_entries() {
        assert!(classify_dropdown(&[plain("a", "LI", "First")]).is_none());
        let items =
            classify_dropdown(&[plain("a", "LI", "First"), plain("b", "A", "Second")]).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn plain_divs_are_not_a_dropdown() {
        assert!(classify_dropdown(&[
            plain("a", "DIV", "Hello"),
            plain("b", "DIV", "World"),
        ])
        .is_none());
    }

    #[test]
    fn summary_is_reproducible_from_fields() {
        let before: Vec<ElementSnapshotEntry> = Vec::new();
        let after = vec![menu_item("m1", "Open"), menu_item("m2", "Save")];
        let report =
            DomChangeReport::from_diff(diff(&before, &after), Duration::from_millis(600), false);

        let summary = report.summary();
        assert!(summary.contains("2 added, 0 removed (2 mutations)"));
        assert!(summary.contains("stabilized in 600ms"));
        assert!(summary.contains("Dropdown/menu detected with 2 items:"));
        assert!(summary.contains("* Open [menuitem]"));
        // Same fields, same summary.
        assert_eq!(summary, report.summary());
    }

    #[test]
    fn mutation_count_invariant_holds() {
        let report = DomChangeReport::from_diff(
            diff(&[plain("x", "BUTTON", "Old")], &[plain("y", "BUTTON", "New")]),
            Duration::from_millis(10),
            false,
        );
        assert_eq!(
            report.mutation_count,
            report.added_elements.len() + report.removed_elements.len()
        );
    }
}
