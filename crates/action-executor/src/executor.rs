//! Action execution pipeline: resolve, dispatch, verify.
//!
//! Every command goes through the same shape: a pre-action baseline
//! snapshot, the action-specific pipeline, then a stabilization wait and
//! diff. Errors are converted into the structured failure taxonomy at this
//! boundary and never escape as panics.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use element_resolver::DefaultElementResolver;
use page_bridge::{PageBridge, ProtocolBridge};
use pagegrip_core_types::{
    ActionExecutionResult, ActionFailure, Command, TurnSnapshot,
};
use snapshot_watch::StabilizeConfig;

use crate::click::{self, ClickReport};
use crate::config::ExecutorConfig;
use crate::errors::ExecError;
use crate::set_value;
use crate::verify::ActionVerifier;

/// Cancellation gate checked between pipeline stages. An action already in
/// flight is never interrupted mid-dispatch; cancellation lands at the next
/// checkpoint.
pub struct ExecCheckpoint<'a> {
    cancel: &'a CancellationToken,
}

impl<'a> ExecCheckpoint<'a> {
    pub fn new(cancel: &'a CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn check(&self, stage: &str) -> Result<(), ExecError> {
        if self.cancel.is_cancelled() {
            debug!(stage, "execution cancelled at checkpoint");
            Err(ExecError::Cancelled(format!("cancelled at {}", stage)))
        } else {
            Ok(())
        }
    }
}

/// Executes commands against one attached page.
pub struct ActionExecutor {
    protocol: Arc<dyn ProtocolBridge>,
    page: Arc<dyn PageBridge>,
    resolver: DefaultElementResolver,
    config: ExecutorConfig,
    stabilize: StabilizeConfig,
}

impl ActionExecutor {
    pub fn new(
        protocol: Arc<dyn ProtocolBridge>,
        page: Arc<dyn PageBridge>,
        resolver: DefaultElementResolver,
        config: ExecutorConfig,
        stabilize: StabilizeConfig,
    ) -> Self {
        Self {
            protocol,
            page,
            resolver,
            config,
            stabilize,
        }
    }

    pub fn protocol(&self) -> &dyn ProtocolBridge {
        self.protocol.as_ref()
    }

    pub fn page(&self) -> &dyn PageBridge {
        self.page.as_ref()
    }

    pub fn resolver(&self) -> &DefaultElementResolver {
        &self.resolver
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run one command to completion. Never returns an error; failures are
    /// folded into the result object.
    pub async fn execute(
        &self,
        turn: &TurnSnapshot,
        command: &Command,
        cancel: &CancellationToken,
    ) -> ActionExecutionResult {
        let started_at = Utc::now();
        let clock = tokio::time::Instant::now();
        let checkpoint = ExecCheckpoint::new(cancel);
        let action = command.action_name();
        let index = command.element_index();

        info!(action, index, "executing command");

        let verifier = ActionVerifier::new(self.page.clone(), self.stabilize);
        let baseline = verifier.capture_baseline().await;

        let outcome = self.run_pipeline(turn, command, &checkpoint).await;
        let latency_ms = clock.elapsed().as_millis() as u64;

        match outcome {
            Ok(state) => {
                let mut result = ActionExecutionResult::success(started_at, latency_ms);

                // Verification is advisory: a dispatched action that already
                // took effect is not failed retroactively.
                match verifier.observe(baseline).await {
                    Ok(report) => {
                        let mut lines = Vec::new();
                        if let Some(state) = state {
                            lines.push(state);
                        }
                        lines.push(report.summary());
                        result = result.with_actual_state(lines.join("\n"));
                    }
                    Err(err) => {
                        warn!(action, error = %err, "post-action verification unavailable");
                        if let Some(state) = state {
                            result = result.with_actual_state(state);
                        }
                    }
                }

                info!(action, index, latency_ms, "command succeeded");
                result
            }
            Err(err) => {
                let code = err.code();
                warn!(action, index, code = code.as_str(), error = %err, "command failed");
                ActionExecutionResult::failure(
                    started_at,
                    latency_ms,
                    ActionFailure {
                        message: err.to_string(),
                        code,
                        action: action.to_string(),
                        element_id: Some(index),
                    },
                )
            }
        }
    }

    /// Dispatch to the action-specific pipeline; returns an optional
    /// provenance note for `actual_state`.
    async fn run_pipeline(
        &self,
        turn: &TurnSnapshot,
        command: &Command,
        checkpoint: &ExecCheckpoint<'_>,
    ) -> Result<Option<String>, ExecError> {
        let element_ref = command.element_ref();
        match command {
            Command::Click { .. } => {
                let report = click::execute_click(self, checkpoint, &element_ref, turn).await?;
                Ok(click_provenance(&report))
            }
            Command::SetValue { value, .. } => {
                let report =
                    set_value::execute_set_value(self, checkpoint, &element_ref, value, turn)
                        .await?;
                Ok(ghost_provenance(Some(&report.resolution)))
            }
        }
    }
}

fn click_provenance(report: &ClickReport) -> Option<String> {
    if report.virtual_target {
        return Some("clicked virtual element at recorded coordinates".to_string());
    }
    let mut note = ghost_provenance(report.resolution.as_ref());
    if report.dispatched_clicks > 1 {
        let retry = "click repeated once after an initial silent dispatch".to_string();
        note = Some(match note {
            Some(existing) => format!("{}\n{}", existing, retry),
            None => retry,
        });
    }
    note
}

/// Ghost recoveries are surfaced so the orchestrator knows the original
/// reference was stale.
fn ghost_provenance(resolution: Option<&element_resolver::ResolutionResult>) -> Option<String> {
    let resolution = resolution?;
    let ghost = resolution.ghost.as_ref()?;
    Some(format!(
        "target recovered via ghost match ({}, confidence {:.2}){}",
        ghost.match_method.name(),
        ghost.confidence,
        ghost
            .new_element_id
            .as_deref()
            .map(|id| format!(", new element id {}", id))
            .unwrap_or_default()
    ))
}
