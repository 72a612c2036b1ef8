//! Fuzzy "ghost match" recovery for stale element references.
//!
//! When every direct lookup tier fails, the engine enumerates live
//! candidates and scores each against the identity signals recorded at
//! snapshot time. The weights are empirically chosen; they are named,
//! overridable constants rather than hard invariants, and behavior is
//! validated through the scoring monotonicity tests below.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use page_bridge::{CandidateElement, CandidateQuery, PageBridge};
use pagegrip_core_types::{GhostMatchMethod, GhostMatchResult, RecoveryInfo};

use crate::errors::ResolveError;

/// Scoring weights and thresholds for ghost matching.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GhostScoring {
    /// Exact match of recorded name against element text/label attributes.
    pub text_exact: f64,

    /// Substring match of recorded name.
    pub text_contains: f64,

    /// Recorded role equals explicit or tag-implied role.
    pub role_match: f64,

    /// Coordinate proximity bands (Euclidean distance between recorded and
    /// current bounding-box centers).
    pub coord_near: f64,
    pub coord_mid: f64,
    pub coord_far: f64,
    pub near_px: f64,
    pub mid_px: f64,
    pub far_px: f64,

    /// Candidate interactivity agrees with the recorded flag.
    pub interactive_bonus: f64,

    /// Recorded interactive, candidate is not.
    pub interactive_penalty: f64,

    /// Minimum accepted confidence.
    pub min_confidence: f64,

    /// Upper bound on candidates enumerated per search.
    pub max_candidates: usize,
}

impl Default for GhostScoring {
    fn default() -> Self {
        Self {
            text_exact: 0.4,
            text_contains: 0.25,
            role_match: 0.3,
            coord_near: 0.3,
            coord_mid: 0.15,
            coord_far: 0.1,
            near_px: 50.0,
            mid_px: 100.0,
            far_px: 150.0,
            interactive_bonus: 0.1,
            interactive_penalty: 0.2,
            min_confidence: 0.5,
            max_candidates: 100,
        }
    }
}

/// Signals that contributed to a candidate's score.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MatchSignals {
    pub text: bool,
    pub role: bool,
    pub coordinates: bool,
}

impl MatchSignals {
    /// Collapse to the reported match method.
    pub fn method(&self) -> GhostMatchMethod {
        let count = self.text as u8 + self.role as u8 + self.coordinates as u8;
        if count >= 2 {
            GhostMatchMethod::Combined
        } else if self.text {
            GhostMatchMethod::Text
        } else if self.role {
            GhostMatchMethod::RoleName
        } else {
            GhostMatchMethod::Coordinates
        }
    }
}

/// Tag-implied ARIA role for elements without an explicit role attribute.
pub fn implied_role(tag_name: &str) -> Option<&'static str> {
    match tag_name.to_ascii_uppercase().as_str() {
        "BUTTON" => Some("button"),
        "A" => Some("link"),
        "INPUT" => Some("textbox"),
        "TEXTAREA" => Some("textbox"),
        "SELECT" => Some("combobox"),
        "OPTION" => Some("option"),
        "LI" => Some("listitem"),
        _ => None,
    }
}

/// Score one candidate against the recorded signals. Pure; clamped to [0, 1].
pub fn score_candidate(
    recovery: &RecoveryInfo,
    candidate: &CandidateElement,
    scoring: &GhostScoring,
) -> (f64, MatchSignals) {
    let mut score = 0.0;
    let mut signals = MatchSignals::default();

    if let Some(name) = recovery.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let needle = name.to_lowercase();
        let fields = [
            candidate.text.as_deref(),
            candidate.aria_label.as_deref(),
            candidate.name_attr.as_deref(),
            candidate.title.as_deref(),
            candidate.placeholder.as_deref(),
        ];
        let mut best = 0.0f64;
        for field in fields.into_iter().flatten() {
            let value = field.trim().to_lowercase();
            if value.is_empty() {
                continue;
            }
            if value == needle {
                best = best.max(scoring.text_exact);
            } else if value.contains(&needle) || needle.contains(&value) {
                best = best.max(scoring.text_contains);
            }
        }
        if best > 0.0 {
            score += best;
            signals.text = true;
        }
    }

    if let Some(role) = recovery.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        let candidate_role = candidate
            .role
            .as_deref()
            .map(str::to_lowercase)
            .or_else(|| implied_role(&candidate.tag_name).map(str::to_string));
        if candidate_role.as_deref() == Some(role.to_lowercase().as_str()) {
            score += scoring.role_match;
            signals.role = true;
        }
    }

    if let Some(recorded) = recovery.coordinates {
        let distance = recorded.distance_to(&candidate.rect.center());
        let coord_score = if distance < scoring.near_px {
            scoring.coord_near
        } else if distance < scoring.mid_px {
            scoring.coord_mid
        } else if distance < scoring.far_px {
            scoring.coord_far
        } else {
            0.0
        };
        if coord_score > 0.0 {
            score += coord_score;
            signals.coordinates = true;
        }
    }

    if recovery.interactive {
        if candidate.interactive {
            score += scoring.interactive_bonus;
        } else {
            score -= scoring.interactive_penalty;
        }
    } else if !candidate.interactive {
        score += scoring.interactive_bonus;
    }

    (score.clamp(0.0, 1.0), signals)
}

/// Fuzzy recovery engine, used as the final resolver tier.
pub struct GhostMatchEngine {
    bridge: Arc<dyn PageBridge>,
    scoring: GhostScoring,
}

impl GhostMatchEngine {
    pub fn new(bridge: Arc<dyn PageBridge>, scoring: GhostScoring) -> Self {
        Self { bridge, scoring }
    }

    pub fn scoring(&self) -> &GhostScoring {
        &self.scoring
    }

    /// Find the best live candidate for the recorded signals.
    ///
    /// Returns `None` when no candidate reaches the confidence floor. Ties
    /// go to the first candidate in document order.
    pub async fn find_ghost_match(
        &self,
        recovery: &RecoveryInfo,
        min_confidence: f64,
    ) -> Result<Option<GhostMatchResult>, ResolveError> {
        let query = CandidateQuery {
            roles: Vec::new(),
            interactive_only: recovery.interactive,
            limit: self.scoring.max_candidates,
        };

        let candidates = self
            .bridge
            .query_candidates(&query)
            .await
            .map_err(|err| ResolveError::BridgeUnavailable(err.to_string()))?;

        debug!(candidates = candidates.len(), "ghost match enumeration");

        let mut best: Option<(f64, MatchSignals, &CandidateElement)> = None;
        for candidate in &candidates {
            let (score, signals) = score_candidate(recovery, candidate, &self.scoring);
            // Strictly greater keeps the first-encountered candidate on ties.
            if best.as_ref().map(|(s, _, _)| score > *s).unwrap_or(true) {
                best = Some((score, signals, candidate));
            }
        }

        let Some((score, signals, candidate)) = best else {
            return Ok(None);
        };

        if score < min_confidence {
            debug!(
                score,
                min_confidence, "best ghost candidate below confidence floor"
            );
            return Ok(None);
        }

        let method = signals.method();
        info!(
            confidence = score,
            method = method.name(),
            tag = %candidate.tag_name,
            "ghost match accepted"
        );

        Ok(Some(GhostMatchResult {
            handle: candidate.to_handle(),
            new_element_id: candidate.element_id.clone(),
            confidence: score,
            match_method: method,
        }))
    }
}
