//! Stale-tolerant action execution.
//!
//! Takes resolved-or-resolvable element references and turns them into real
//! input events, with an obstruction gate before dispatch, bounded geometry
//! recovery, a hydration-gap retry for silent clicks, and post-action
//! verification via snapshot diffing.

pub mod click;
pub mod config;
pub mod errors;
pub mod executor;
pub mod geometry;
pub mod input;
pub mod set_value;
pub mod state;
pub mod verify;

pub use click::ClickReport;
pub use config::ExecutorConfig;
pub use errors::ExecError;
pub use executor::{ActionExecutor, ExecCheckpoint};
pub use set_value::SetValueReport;
pub use verify::ActionVerifier;
