//! Resolver chain orchestration with ghost-match fallback.

use std::sync::Arc;

use page_bridge::{PageBridge, ProtocolBridge, RetryPolicy};
use pagegrip_core_types::{
    ElementHandle, GhostMatchResult, LogicalElementRef, RecoveryInfo, TurnSnapshot,
};
use tracing::{debug, info, warn};

use crate::errors::{ResolveError, StrategyAttempt};
use crate::ghost::{GhostMatchEngine, GhostScoring};
use crate::strategies::{
    AxMapStrategy, ResolveStrategy, SelectorIdStrategy, StableAttributeStrategy, StrategyKind,
};

/// Outcome of a successful resolution.
#[derive(Clone, Debug)]
pub struct ResolutionResult {
    /// Live handle to act on.
    pub handle: ElementHandle,

    /// Which tier succeeded.
    pub strategy: StrategyKind,

    /// 1.0 for direct lookups; the match score for ghost recoveries.
    pub confidence: f64,

    /// Present when the element was recovered via ghost match.
    pub ghost: Option<GhostMatchResult>,
}

impl ResolutionResult {
    pub fn from_ghost(&self) -> bool {
        self.ghost.is_some()
    }
}

/// Turns a logical element reference into a live handle, trying ordered
/// strategies; ghost match runs only after every direct tier missed and
/// only when recovery signals exist.
pub struct DefaultElementResolver {
    strategies: Vec<Arc<dyn ResolveStrategy>>,
    ghost: GhostMatchEngine,
    min_confidence: f64,
}

impl DefaultElementResolver {
    pub fn new(
        protocol: Arc<dyn ProtocolBridge>,
        page: Arc<dyn PageBridge>,
        scoring: GhostScoring,
        retry: RetryPolicy,
    ) -> Self {
        let strategies: Vec<Arc<dyn ResolveStrategy>> = vec![
            Arc::new(AxMapStrategy),
            Arc::new(StableAttributeStrategy::new(protocol.clone())),
            Arc::new(SelectorIdStrategy::new(protocol, page.clone(), retry)),
        ];
        let min_confidence = scoring.min_confidence;
        Self {
            strategies,
            ghost: GhostMatchEngine::new(page, scoring),
            min_confidence,
        }
    }

    /// Resolve a reference, exhausting every tier before failing.
    pub async fn resolve(
        &self,
        element_ref: &LogicalElementRef,
        recovery: Option<&RecoveryInfo>,
        turn: &TurnSnapshot,
    ) -> Result<ResolutionResult, ResolveError> {
        let mut attempts: Vec<StrategyAttempt> = Vec::new();

        for strategy in &self.strategies {
            debug!(
                index = element_ref.index,
                strategy = strategy.name(),
                "trying resolution strategy"
            );
            match strategy.resolve(element_ref, turn).await {
                Ok(Some(handle)) => {
                    info!(
                        index = element_ref.index,
                        strategy = strategy.name(),
                        "element resolved"
                    );
                    return Ok(ResolutionResult {
                        handle,
                        strategy: strategy.kind(),
                        confidence: 1.0,
                        ghost: None,
                    });
                }
                Ok(None) => {
                    attempts.push(StrategyAttempt {
                        strategy: strategy.name().to_string(),
                        reason: "no match".to_string(),
                    });
                }
                Err(err) => {
                    warn!(
                        index = element_ref.index,
                        strategy = strategy.name(),
                        error = %err,
                        "resolution strategy failed"
                    );
                    attempts.push(StrategyAttempt {
                        strategy: strategy.name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        if let Some(recovery) = recovery {
            debug!(index = element_ref.index, "entering ghost match fallback");
            match self.ghost.find_ghost_match(recovery, self.min_confidence).await {
                Ok(Some(ghost)) => {
                    info!(
                        index = element_ref.index,
                        confidence = ghost.confidence,
                        method = ghost.match_method.name(),
                        "element recovered via ghost match"
                    );
                    return Ok(ResolutionResult {
                        handle: ghost.handle.clone(),
                        strategy: StrategyKind::GhostMatch,
                        confidence: ghost.confidence,
                        ghost: Some(ghost),
                    });
                }
                Ok(None) => {
                    attempts.push(StrategyAttempt {
                        strategy: StrategyKind::GhostMatch.name().to_string(),
                        reason: "no candidate above confidence floor".to_string(),
                    });
                }
                Err(err) => {
                    attempts.push(StrategyAttempt {
                        strategy: StrategyKind::GhostMatch.name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Err(ResolveError::NotFound {
            attempts,
            recovery_present: recovery.is_some(),
        })
    }
}
