//! Containment: stop the target and mark it forensically handled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Providers, StageReport, StageStatus};
use crate::case::CaseContext;
use crate::config::CaselockConfig;
use crate::error::{CaselockError, Result};
use crate::evidence::{EvidenceRecord, EvidenceType};
use crate::provider::PowerState;
use crate::waiter::StateWaiter;

/// Outcome of the stop request, as persisted in the evidence payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopReport {
    pub already_stopped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<PowerState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<PowerState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainmentDetail {
    pub state_before: PowerState,
    pub already_stopped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_state: Option<String>,
}

/// Stops the target after evidence collection and waits (bounded) for the
/// stopped state.
///
/// A wait timeout does not fail the stage: the stop request stays in flight
/// on the provider side and the outcome is recorded as `final_state =
/// "timeout"`. The forensics tags are applied on every path that reaches
/// them, including after a timeout, so downstream operators always see the
/// resource marked as in containment.
pub struct ContainmentStage<'a> {
    providers: Providers<'a>,
    config: &'a CaselockConfig,
}

impl<'a> ContainmentStage<'a> {
    pub fn new(providers: Providers<'a>, config: &'a CaselockConfig) -> Self {
        Self { providers, config }
    }

    pub async fn run(&self, ctx: &CaseContext) -> Result<StageReport<ContainmentDetail>> {
        let timestamp = ctx.stage_timestamp();
        let resources = self.providers.resources;

        let state_before = resources.power_state(ctx.target_id()).await?;
        info!(
            target_id = %ctx.target_id(),
            case_id = %ctx.case_id(),
            state = %state_before,
            "containment: current power state"
        );

        let mut stop = StopReport::default();

        if state_before == PowerState::Stopped {
            info!(target_id = %ctx.target_id(), "target already stopped");
            stop.already_stopped = true;
        } else {
            let transition = resources.request_stop(ctx.target_id()).await?;
            info!(
                previous = %transition.previous_state,
                current = %transition.current_state,
                "stop requested"
            );
            stop.previous_state = Some(transition.previous_state);
            stop.current_state = Some(transition.current_state);

            let waiter = StateWaiter::new(
                self.config.containment.poll_interval(),
                self.config.containment.max_attempts,
            );
            let waited = waiter
                .wait_until(
                    ctx.target_id(),
                    PowerState::Stopped,
                    || resources.power_state(ctx.target_id()),
                    |state| state.precludes(PowerState::Stopped),
                )
                .await;

            match waited {
                Ok(attempts) => {
                    info!(attempts, "target stopped");
                    stop.final_state = Some(PowerState::Stopped.to_string());
                }
                Err(e @ CaselockError::WaitTimeout { .. }) => {
                    warn!(error = %e, "stop still in flight, proceeding to tagging");
                    stop.final_state = Some("timeout".to_string());
                    stop.error = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        // Tagging happens regardless of the wait outcome: it marks the
        // resource as in containment for downstream operators.
        let mut tags = BTreeMap::new();
        tags.insert("ForensicsCaseId".to_string(), ctx.case_id().to_string());
        tags.insert("ForensicsStatus".to_string(), "contained".to_string());
        tags.insert("ForensicsTimestamp".to_string(), timestamp.clone());
        resources.tag(ctx.target_id(), &tags).await?;
        info!(target_id = %ctx.target_id(), "forensics tags applied");

        let body = serde_json::json!({
            "case_id": ctx.case_id(),
            "target_id": ctx.target_id(),
            "action": "stop_instance",
            "timestamp": timestamp,
            "state_before": state_before,
            "stop_result": &stop,
        });
        let record = EvidenceRecord::json(ctx, EvidenceType::Containment, &timestamp, body);
        let locator = self.providers.store.put(&record).await?;

        Ok(StageReport {
            status: StageStatus::Success,
            case_id: ctx.case_id().to_string(),
            target_id: ctx.target_id().to_string(),
            evidence_type: EvidenceType::Containment,
            evidence_address: locator,
            timestamp,
            detail: ContainmentDetail {
                state_before,
                already_stopped: stop.already_stopped,
                final_state: stop.final_state,
            },
        })
    }
}
