//! Abstract capabilities the pagegrip core is wired against.
//!
//! The hosting shell provides concrete implementations: a debugging-protocol
//! transport and a content-script query channel. This crate defines the
//! traits, the structured query/result types, the enriched bridge error, and
//! the shared retry policy.

pub mod bridge;
pub mod errors;
pub mod retry;

pub use bridge::*;
pub use errors::*;
pub use retry::*;
