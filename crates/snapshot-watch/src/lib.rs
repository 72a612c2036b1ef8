//! Snapshot diffing, stabilization waiting and change reporting.
//!
//! Leaf layer of the action core: a pure set-difference over interactive
//! element snapshots, a poll loop that detects when a mutating page has
//! settled, and the change report handed back to the orchestrator after
//! every action.

pub mod differ;
pub mod errors;
pub mod report;
pub mod stabilize;

pub use differ::{diff, SnapshotDiff};
pub use errors::WatchError;
pub use report::{classify_dropdown, DomChangeReport, DropdownItem};
pub use stabilize::{StabilizationOutcome, StabilizationWaiter, StabilizeConfig};
