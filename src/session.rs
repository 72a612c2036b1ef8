//! Session-scoped execution context.
//!
//! All per-page state (bridges, cancellation, the latest turn snapshot)
//! hangs off a `SessionContext`; nothing is process-global, so concurrent
//! sessions against different pages never share mutable state.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use page_bridge::{BridgeErrorKind, PageBridge, ProtocolBridge};
use pagegrip_core_types::{SessionId, TurnSnapshot};

use crate::errors::GripError;

/// One attached page: its bridges, cancellation token, and the snapshot of
/// the most recent agent turn.
pub struct SessionContext {
    id: SessionId,
    protocol: Arc<dyn ProtocolBridge>,
    page: Arc<dyn PageBridge>,
    cancel: CancellationToken,
    turn: RwLock<TurnSnapshot>,
}

impl SessionContext {
    pub fn new(
        id: SessionId,
        protocol: Arc<dyn ProtocolBridge>,
        page: Arc<dyn PageBridge>,
    ) -> Self {
        Self {
            id,
            protocol,
            page,
            cancel: CancellationToken::new(),
            turn: RwLock::new(TurnSnapshot::default()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn protocol(&self) -> Arc<dyn ProtocolBridge> {
        self.protocol.clone()
    }

    pub fn page(&self) -> Arc<dyn PageBridge> {
        self.page.clone()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Replace the stored turn snapshot after a new perception pass.
    pub fn store_turn(&self, turn: TurnSnapshot) {
        debug!(session = %self.id, elements = turn.entries.len(), "turn snapshot stored");
        *self.turn.write() = turn;
    }

    /// Clone of the current turn snapshot.
    pub fn turn(&self) -> TurnSnapshot {
        self.turn.read().clone()
    }

    /// Acquire the exclusive debugger attachment.
    ///
    /// The debugger slot is exclusive per page; a stale holder (a crashed
    /// prior run, an abandoned devtools session) is displaced once by
    /// detaching and re-attaching. A second contention is a real conflict
    /// and fails.
    pub async fn acquire_attachment(&self) -> Result<(), GripError> {
        match self.protocol.attach().await {
            Ok(()) => Ok(()),
            Err(err) if err.kind == BridgeErrorKind::AlreadyAttached => {
                warn!(session = %self.id, "attachment held elsewhere; displacing");
                self.protocol
                    .detach()
                    .await
                    .map_err(|e| GripError::Attachment(e.to_string()))?;
                self.protocol
                    .attach()
                    .await
                    .map_err(|e| GripError::Attachment(e.to_string()))
            }
            Err(err) => Err(GripError::Attachment(err.to_string())),
        }
    }

    /// Cancel in-flight work and release the attachment. Detach failures
    /// are logged, not surfaced; the session is gone either way.
    pub async fn release(&self) {
        self.cancel.cancel();
        if let Err(err) = self.protocol.detach().await {
            warn!(session = %self.id, error = %err, "detach on release failed");
        }
        info!(session = %self.id, "session released");
    }
}

/// Open sessions keyed by session id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionContext>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session and acquire its attachment.
    pub async fn open(
        &self,
        id: SessionId,
        protocol: Arc<dyn ProtocolBridge>,
        page: Arc<dyn PageBridge>,
    ) -> Result<Arc<SessionContext>, GripError> {
        if self.sessions.contains_key(id.as_str()) {
            return Err(GripError::SessionExists(id.to_string()));
        }
        let session = Arc::new(SessionContext::new(id, protocol, page));
        session.acquire_attachment().await?;
        info!(session = %session.id(), "session opened");
        self.sessions
            .insert(session.id().to_string(), session.clone());
        Ok(session)
    }

    pub fn get(&self, id: &SessionId) -> Result<Arc<SessionContext>, GripError> {
        self.sessions
            .get(id.as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GripError::SessionUnknown(id.to_string()))
    }

    /// Close and release a session.
    pub async fn close(&self, id: &SessionId) -> Result<(), GripError> {
        let (_, session) = self
            .sessions
            .remove(id.as_str())
            .ok_or_else(|| GripError::SessionUnknown(id.to_string()))?;
        session.release().await;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
