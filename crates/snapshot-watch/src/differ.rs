//! Set difference between two interactive-element snapshots.
//!
//! Keyed by `ElementSnapshotEntry::snapshot_key()`; a secondary heuristic
//! catches present-but-hidden elements that became visible without a key
//! change (a collapsed menu unfolding, for example).

use std::collections::{HashMap, HashSet};

use pagegrip_core_types::ElementSnapshotEntry;

/// Added and removed elements between two point-in-time snapshots.
#[derive(Clone, Debug, Default)]
pub struct SnapshotDiff {
    pub added: Vec<ElementSnapshotEntry>,
    pub removed: Vec<ElementSnapshotEntry>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn mutation_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// Pure set difference by key, O(|before| + |after|).
pub fn diff(before: &[ElementSnapshotEntry], after: &[ElementSnapshotEntry]) -> SnapshotDiff {
    let before_keys: HashMap<String, &ElementSnapshotEntry> = before
        .iter()
        .map(|entry| (entry.snapshot_key(), entry))
        .collect();
    let after_keys: HashMap<String, &ElementSnapshotEntry> = after
        .iter()
        .map(|entry| (entry.snapshot_key(), entry))
        .collect();

    let mut added: Vec<ElementSnapshotEntry> = after
        .iter()
        .filter(|entry| !before_keys.contains_key(&entry.snapshot_key()))
        .cloned()
        .collect();

    let removed: Vec<ElementSnapshotEntry> = before
        .iter()
        .filter(|entry| !after_keys.contains_key(&entry.snapshot_key()))
        .cloned()
        .collect();

    // Present-but-hidden elements that became visible keep their key, but
    // their (tag, role, text-prefix) triple is novel relative to `before`.
    let before_triples: HashSet<(String, String, String)> =
        before.iter().map(|e| e.identity_triple()).collect();

    let added_ids: HashSet<String> = added
        .iter()
        .filter_map(|e| e.id.clone())
        .filter(|id| !id.is_empty())
        .collect();
    let added_identities: HashSet<(String, String, String)> = added
        .iter()
        .map(|e| {
            (
                e.text.clone().unwrap_or_default(),
                e.tag_name.clone(),
                e.role.clone().unwrap_or_default(),
            )
        })
        .collect();

    for entry in after {
        if !entry.interactive || !entry.has_text() {
            continue;
        }
        if before_triples.contains(&entry.identity_triple()) {
            continue;
        }
        // Dedupe against the primary added set by id, then by
        // (text, tag, role) equality.
        if let Some(id) = entry.id.as_deref().filter(|s| !s.is_empty()) {
            if added_ids.contains(id) {
                continue;
            }
        }
        let identity = (
            entry.text.clone().unwrap_or_default(),
            entry.tag_name.clone(),
            entry.role.clone().unwrap_or_default(),
        );
        if added_identities.contains(&identity) {
            continue;
        }
        added.push(entry.clone());
    }

    SnapshotDiff { added, removed }
}
