//! Stale-tolerant browser action core for autonomous agents.
//!
//! An agent perceives a page, plans against that snapshot, and acts a few
//! seconds later against a page that may have re-rendered in the meantime.
//! This crate owns the gap: multi-tier element resolution with ghost-match
//! recovery for stale references, adaptive stabilization waiting, and
//! click/set-value execution with obstruction and silent-failure checks.
//!
//! The core is transport-agnostic: callers supply a [`ProtocolBridge`]
//! (remote-debugging commands) and a [`PageBridge`] (typed in-page
//! queries), open a session, store the latest turn snapshot on it, and
//! dispatch commands.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use pagegrip::{dispatch, executor_for, PagegripConfig, SessionRegistry};
//! # use pagegrip::{Command, SessionId, TurnSnapshot};
//! # use pagegrip::{PageBridge, ProtocolBridge};
//! # async fn run(protocol: Arc<dyn ProtocolBridge>, page: Arc<dyn PageBridge>) {
//! let registry = SessionRegistry::new();
//! let session = registry
//!     .open(SessionId::new(), protocol, page)
//!     .await
//!     .unwrap();
//! session.store_turn(TurnSnapshot::default());
//!
//! let config = PagegripConfig::default();
//! let executor = executor_for(&session, &config);
//! let result = dispatch(
//!     &session,
//!     &executor,
//!     &Command::Click { element_id: 3, selector_path: None },
//! )
//! .await;
//! assert!(result.success || result.error.is_some());
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod session;

pub use config::PagegripConfig;
pub use dispatch::{dispatch, executor_for};
pub use errors::GripError;
pub use session::{SessionContext, SessionRegistry};

pub use action_executor::{ActionExecutor, ExecError, ExecutorConfig};
pub use element_resolver::{DefaultElementResolver, GhostScoring, ResolutionResult, StrategyKind};
pub use page_bridge::{
    BridgeError, BridgeErrorKind, CandidateElement, CandidateQuery, DocumentProbe, HitTestResult,
    PageBridge, ProtocolBridge, RetryPolicy,
};
pub use pagegrip_core_types::{
    ActionErrorCode, ActionExecutionResult, ActionFailure, ActionId, Command, ElementHandle,
    ElementSnapshotEntry, GhostMatchResult, LogicalElementRef, Point, Rect, RecoveryInfo,
    SessionId, TurnSnapshot,
};
pub use snapshot_watch::{DomChangeReport, SnapshotDiff, StabilizeConfig};
