//! Element resolution with self-healing recovery.
//!
//! Turns a logical element reference from a prior snapshot back into a live
//! handle. Direct tiers run first (accessibility map, stable annotation
//! attribute, legacy unique selector); when all of them miss and recovery
//! signals were recorded, the ghost-match engine scores live candidates
//! against the recorded identity and takes the best one above the
//! confidence floor.

pub mod errors;
pub mod ghost;
pub mod resolver;
pub mod strategies;

pub use errors::{ResolveError, StrategyAttempt};
pub use ghost::{score_candidate, GhostMatchEngine, GhostScoring, MatchSignals};
pub use resolver::{DefaultElementResolver, ResolutionResult};
pub use strategies::{resolve_selector, ResolveStrategy, StrategyKind, STABLE_ID_ATTR};
