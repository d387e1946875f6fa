//! Explicit state machine over the four stage results.
//!
//! The stages themselves stay independently invocable; this orchestrator is
//! the trigger-side sequencing contract made concrete: recommended order,
//! per-stage outcome tracking, and short-circuiting on a hard failure.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::case::CaseContext;
use crate::config::CaselockConfig;
use crate::error::Result;
use crate::stages::{
    ContainmentStage, MemoryCaptureStage, MetadataCollectionStage, Providers, VolumeSnapshotStage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    MemoryCapture,
    VolumeSnapshot,
    MetadataCollection,
    Containment,
}

impl StageKind {
    /// Recommended invocation order: volatile evidence first, containment
    /// last.
    pub const ORDER: [StageKind; 4] = [
        StageKind::MemoryCapture,
        StageKind::VolumeSnapshot,
        StageKind::MetadataCollection,
        StageKind::Containment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemoryCapture => "memory_capture",
            Self::VolumeSnapshot => "volume_snapshot",
            Self::MetadataCollection => "metadata_collection",
            Self::Containment => "containment",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum StageOutcome {
    Pending,
    Success { evidence_address: String },
    Failed { error: String },
    Skipped,
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-stage outcomes of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub memory_capture: StageOutcome,
    pub volume_snapshot: StageOutcome,
    pub metadata_collection: StageOutcome,
    pub containment: StageOutcome,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            memory_capture: StageOutcome::Pending,
            volume_snapshot: StageOutcome::Pending,
            metadata_collection: StageOutcome::Pending,
            containment: StageOutcome::Pending,
        }
    }
}

impl PipelineState {
    pub fn outcome(&self, kind: StageKind) -> &StageOutcome {
        match kind {
            StageKind::MemoryCapture => &self.memory_capture,
            StageKind::VolumeSnapshot => &self.volume_snapshot,
            StageKind::MetadataCollection => &self.metadata_collection,
            StageKind::Containment => &self.containment,
        }
    }

    fn set(&mut self, kind: StageKind, outcome: StageOutcome) {
        match kind {
            StageKind::MemoryCapture => self.memory_capture = outcome,
            StageKind::VolumeSnapshot => self.volume_snapshot = outcome,
            StageKind::MetadataCollection => self.metadata_collection = outcome,
            StageKind::Containment => self.containment = outcome,
        }
    }

    fn aggregate(&self) -> PipelineStatus {
        let outcomes = StageKind::ORDER.map(|kind| self.outcome(kind));
        let completed = outcomes.iter().filter(|o| o.is_success()).count();
        let total = outcomes.len();

        if completed == total {
            return PipelineStatus::Success;
        }

        let first_failure = outcomes.iter().find_map(|outcome| match outcome {
            StageOutcome::Failed { error } => Some(error.clone()),
            _ => None,
        });

        if completed > 0 {
            PipelineStatus::PartialSuccess { completed, total }
        } else {
            PipelineStatus::Failed {
                reason: first_failure.unwrap_or_else(|| "no stage executed".to_string()),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum PipelineStatus {
    Success,
    PartialSuccess { completed: usize, total: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub case_id: String,
    pub target_id: String,
    pub status: PipelineStatus,
    pub stages: PipelineState,
}

/// Runs the four stages in the recommended order against one target.
pub struct Pipeline<'a> {
    providers: Providers<'a>,
    config: &'a CaselockConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(providers: Providers<'a>, config: &'a CaselockConfig) -> Self {
        Self { providers, config }
    }

    /// Drives every stage, tolerating mid-pipeline failure: a hard stage
    /// failure is recorded and the remaining stages are skipped unless
    /// `pipeline.continue_on_failure` is set.
    pub async fn run(&self, ctx: &CaseContext) -> PipelineReport {
        info!(case_id = %ctx.case_id(), target_id = %ctx.target_id(), "starting response pipeline");

        let mut state = PipelineState::default();
        let mut aborted = false;

        for kind in StageKind::ORDER {
            if aborted {
                state.set(kind, StageOutcome::Skipped);
                continue;
            }

            match self.run_stage(kind, ctx).await {
                Ok(evidence_address) => {
                    state.set(kind, StageOutcome::Success { evidence_address });
                }
                Err(e) => {
                    error!(stage = %kind, error = %e, "stage failed");
                    state.set(
                        kind,
                        StageOutcome::Failed {
                            error: e.to_string(),
                        },
                    );
                    if !self.config.pipeline.continue_on_failure {
                        aborted = true;
                    }
                }
            }
        }

        let status = state.aggregate();
        info!(case_id = %ctx.case_id(), ?status, "response pipeline finished");

        PipelineReport {
            case_id: ctx.case_id().to_string(),
            target_id: ctx.target_id().to_string(),
            status,
            stages: state,
        }
    }

    async fn run_stage(&self, kind: StageKind, ctx: &CaseContext) -> Result<String> {
        match kind {
            StageKind::MemoryCapture => MemoryCaptureStage::new(self.providers, self.config)
                .run(ctx)
                .await
                .map(|report| report.evidence_address),
            StageKind::VolumeSnapshot => VolumeSnapshotStage::new(self.providers)
                .run(ctx)
                .await
                .map(|report| report.evidence_address),
            StageKind::MetadataCollection => {
                MetadataCollectionStage::new(self.providers, self.config)
                    .run(ctx)
                    .await
                    .map(|report| report.evidence_address)
            }
            StageKind::Containment => ContainmentStage::new(self.providers, self.config)
                .run(ctx)
                .await
                .map(|report| report.evidence_address),
        }
    }
}
