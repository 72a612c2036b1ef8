//! Wiring from a session to a ready-to-run executor, plus the dispatch
//! entry point the orchestrator calls per action.

use tracing::info;

use action_executor::ActionExecutor;
use element_resolver::DefaultElementResolver;
use pagegrip_core_types::{ActionExecutionResult, ActionId, Command};

use crate::config::PagegripConfig;
use crate::session::SessionContext;

/// Build an executor bound to a session's bridges.
pub fn executor_for(session: &SessionContext, config: &PagegripConfig) -> ActionExecutor {
    let resolver = DefaultElementResolver::new(
        session.protocol(),
        session.page(),
        config.scoring,
        config.retry,
    );
    ActionExecutor::new(
        session.protocol(),
        session.page(),
        resolver,
        config.executor,
        config.stabilize,
    )
}

/// Execute one command against a session's current turn snapshot.
///
/// Always returns a result object; failures are folded into it rather than
/// propagated.
pub async fn dispatch(
    session: &SessionContext,
    executor: &ActionExecutor,
    command: &Command,
) -> ActionExecutionResult {
    let action_id = ActionId::new();
    let turn = session.turn();

    info!(
        session = %session.id(),
        action_id = %action_id,
        action = command.action_name(),
        index = command.element_index(),
        "dispatching action"
    );

    let result = executor
        .execute(&turn, command, session.cancel_token())
        .await;

    info!(
        session = %session.id(),
        action_id = %action_id,
        success = result.success,
        latency_ms = result.latency_ms,
        "action finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRegistry;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use page_bridge::{
        BridgeError, CandidateElement, CandidateQuery, DocumentProbe, HitTestResult, PageBridge,
        ProtocolBridge,
    };
    use pagegrip_core_types::{
        ElementHandle, ElementSnapshotEntry, Rect, SessionId, TurnSnapshot,
    };

    /// Protocol fake whose first attach reports contention; tracks call
    /// counts.
    struct ContendedProtocol {
        attaches: AtomicU32,
        detaches: AtomicU32,
        contended: bool,
    }

    impl ContendedProtocol {
        fn new(contended: bool) -> Self {
            Self {
                attaches: AtomicU32::new(0),
                detaches: AtomicU32::new(0),
                contended,
            }
        }
    }

    #[async_trait]
    impl ProtocolBridge for ContendedProtocol {
        async fn send(&self, method: &str, _params: Value) -> Result<Value, BridgeError> {
            match method {
                "DOM.getBoxModel" => Ok(json!({
                    "model": { "content": [0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0] }
                })),
                _ => Ok(json!({})),
            }
        }

        async fn attach(&self) -> Result<(), BridgeError> {
            let n = self.attaches.fetch_add(1, Ordering::SeqCst);
            if self.contended && n == 0 {
                Err(BridgeError::already_attached("debugger slot held"))
            } else {
                Ok(())
            }
        }

        async fn detach(&self) -> Result<(), BridgeError> {
            self.detaches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct QuietPage {
        probes: std::sync::Mutex<Vec<DocumentProbe>>,
    }

    impl QuietPage {
        fn new() -> Self {
            let probe = |body: &str| DocumentProbe {
                url: "https://q.test/".to_string(),
                body_prefix: body.to_string(),
            };
            Self {
                probes: std::sync::Mutex::new(vec![probe("before"), probe("after")]),
            }
        }
    }

    #[async_trait]
    impl PageBridge for QuietPage {
        async fn interactive_snapshot(&self) -> Result<Vec<ElementSnapshotEntry>, BridgeError> {
            Ok(Vec::new())
        }

        async fn unique_selector_id(&self, _index: u32) -> Result<String, BridgeError> {
            Err(BridgeError::unavailable("none"))
        }

        async fn network_idle(&self) -> Result<bool, BridgeError> {
            Ok(true)
        }

        async fn visual_feedback(&self, _x: f64, _y: f64) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn query_candidates(
            &self,
            _query: &CandidateQuery,
        ) -> Result<Vec<CandidateElement>, BridgeError> {
            Ok(Vec::new())
        }

        async fn element_rect(&self, _handle: &ElementHandle) -> Result<Option<Rect>, BridgeError> {
            Ok(None)
        }

        async fn scroll_into_view(&self, _handle: &ElementHandle) -> Result<bool, BridgeError> {
            Ok(true)
        }

        async fn hit_test(
            &self,
            _x: f64,
            _y: f64,
            _target: &ElementHandle,
        ) -> Result<HitTestResult, BridgeError> {
            Ok(HitTestResult::Target)
        }

        async fn document_probe(&self) -> Result<DocumentProbe, BridgeError> {
            let mut probes = self.probes.lock().unwrap();
            if probes.len() > 1 {
                Ok(probes.remove(0))
            } else {
                Ok(probes.first().cloned().unwrap_or_default())
            }
        }

        async fn commit_input(&self, _handle: &ElementHandle) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn force_layout(&self, _handle: &ElementHandle) -> Result<(), BridgeError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn contended_attachment_is_displaced_once() {
        let protocol = Arc::new(ContendedProtocol::new(true));
        let registry = SessionRegistry::new();

        let session = registry
            .open(SessionId::new(), protocol.clone(), Arc::new(QuietPage::new()))
            .await
            .unwrap();

        // First attach fails, detach displaces the holder, second succeeds.
        assert_eq!(protocol.attaches.load(Ordering::SeqCst), 2);
        assert_eq!(protocol.detaches.load(Ordering::SeqCst), 1);

        registry.close(session.id()).await.unwrap();
        assert!(registry.is_empty());
        assert_eq!(protocol.detaches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn duplicate_session_id_is_rejected() {
        let registry = SessionRegistry::new();
        let id = SessionId::new();
        registry
            .open(
                id.clone(),
                Arc::new(ContendedProtocol::new(false)),
                Arc::new(QuietPage::new()),
            )
            .await
            .unwrap();

        let err = registry
            .open(
                id,
                Arc::new(ContendedProtocol::new(false)),
                Arc::new(QuietPage::new()),
            )
            .await
            .err()
            .expect("second open with the same id must fail");
        assert!(matches!(err, crate::errors::GripError::SessionExists(_)));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_runs_click_against_stored_turn() {
        let registry = SessionRegistry::new();
        let session = registry
            .open(
                SessionId::new(),
                Arc::new(ContendedProtocol::new(false)),
                Arc::new(QuietPage::new()),
            )
            .await
            .unwrap();

        let mut turn = TurnSnapshot::default();
        turn.entries.insert(
            1,
            ElementSnapshotEntry {
                id: Some("ok".to_string()),
                tag_name: "BUTTON".to_string(),
                interactive: true,
                ..Default::default()
            },
        );
        turn.ax_backend_nodes = Some(HashMap::from([(1, 42_i64)]));
        session.store_turn(turn);

        let executor = executor_for(&session, &PagegripConfig::default());
        let result = dispatch(
            &session,
            &executor,
            &Command::Click {
                element_id: 1,
                selector_path: None,
            },
        )
        .await;

        assert!(result.success, "unexpected failure: {:?}", result.error);
    }

    #[tokio::test]
    async fn released_session_cancels_in_flight_work() {
        let registry = SessionRegistry::new();
        let session = registry
            .open(
                SessionId::new(),
                Arc::new(ContendedProtocol::new(false)),
                Arc::new(QuietPage::new()),
            )
            .await
            .unwrap();

        let token = session.cancel_token().clone();
        registry.close(session.id()).await.unwrap();
        assert!(token.is_cancelled());
    }
}
