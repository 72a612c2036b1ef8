//! Bridge error type with enriched metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// High-level error categories surfaced by either bridge.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeErrorKind {
    #[error("protocol i/o failure")]
    ProtocolIo,

    #[error("another debugger is already attached")]
    AlreadyAttached,

    #[error("no active attachment")]
    NotAttached,

    #[error("page bridge unavailable")]
    BridgeUnavailable,

    #[error("operation timed out")]
    Timeout,

    #[error("internal error")]
    Internal,
}

/// Enriched error metadata passed back to higher layers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BridgeError {
    pub kind: BridgeErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for BridgeError {}

impl BridgeError {
    pub fn new(kind: BridgeErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: false,
        }
    }

    pub fn protocol(hint: impl Into<String>) -> Self {
        Self::new(BridgeErrorKind::ProtocolIo).with_hint(hint)
    }

    pub fn unavailable(hint: impl Into<String>) -> Self {
        Self::new(BridgeErrorKind::BridgeUnavailable)
            .with_hint(hint)
            .retriable(true)
    }

    pub fn already_attached(hint: impl Into<String>) -> Self {
        Self::new(BridgeErrorKind::AlreadyAttached).with_hint(hint)
    }

    pub fn timeout(hint: impl Into<String>) -> Self {
        Self::new(BridgeErrorKind::Timeout).with_hint(hint).retriable(true)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }
}
