//! Volatile memory capture stage.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Providers, StageReport, StageStatus};
use crate::case::CaseContext;
use crate::config::CaselockConfig;
use crate::error::Result;
use crate::evidence::{self, EvidenceType};
use crate::exec::{RemoteExecutor, memory_capture_batch};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCaptureDetail {
    pub job_id: String,
}

/// Drives a kernel-module memory acquisition on the target through the
/// remote-command channel.
///
/// The stage persists nothing locally: the batch itself uploads the image to
/// the evidence store and removes the on-host copy. A batch failure (module
/// missing, insufficient space, empty dump) propagates as an execution
/// failure and leaves no evidence record for the attempt.
pub struct MemoryCaptureStage<'a> {
    providers: Providers<'a>,
    config: &'a CaselockConfig,
}

impl<'a> MemoryCaptureStage<'a> {
    pub fn new(providers: Providers<'a>, config: &'a CaselockConfig) -> Self {
        Self { providers, config }
    }

    pub async fn run(&self, ctx: &CaseContext) -> Result<StageReport<MemoryCaptureDetail>> {
        let timestamp = ctx.stage_timestamp();
        let address = evidence::address(
            ctx.case_id(),
            ctx.target_id(),
            EvidenceType::MemoryDump,
            &timestamp,
        );
        let destination = self.providers.store.locator(&address);
        let dump_path = format!("{}/dump-{timestamp}.lime", self.config.capture.dump_dir);

        info!(
            target_id = %ctx.target_id(),
            case_id = %ctx.case_id(),
            destination = %destination,
            "starting memory capture"
        );

        let commands = memory_capture_batch(&self.config.capture, &dump_path, &destination);
        let executor = RemoteExecutor::new(self.providers.remote)
            .with_poll_interval(self.config.remote.poll_interval());
        let result = executor
            .execute(
                ctx.target_id(),
                &commands,
                self.config.remote.capture_timeout(),
            )
            .await?;

        info!(job_id = %result.job_id, destination = %destination, "memory capture complete");

        Ok(StageReport {
            status: StageStatus::Success,
            case_id: ctx.case_id().to_string(),
            target_id: ctx.target_id().to_string(),
            evidence_type: EvidenceType::MemoryDump,
            evidence_address: destination,
            timestamp,
            detail: MemoryCaptureDetail {
                job_id: result.job_id.to_string(),
            },
        })
    }
}
