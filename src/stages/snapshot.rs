//! Point-in-time snapshots of the target's attached volumes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Providers, StageReport, StageStatus};
use crate::case::CaseContext;
use crate::error::{CaselockError, Result};
use crate::evidence::{self, EvidenceRecord, EvidenceType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub snapshot_id: String,
    pub volume_id: String,
    pub device_name: String,
    pub state: String,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSnapshotDetail {
    pub snapshots: Vec<SnapshotRecord>,
    pub total_volumes: usize,
}

/// Issues an asynchronous snapshot-create request per attached volume and
/// persists the aggregate as one evidence record.
///
/// Snapshot completion can take far longer than the pipeline's acceptable
/// latency, so only the in-progress snapshot ids are recorded; nothing waits
/// for the completed state. A failure on any volume aborts the whole stage
/// before the record is written.
pub struct VolumeSnapshotStage<'a> {
    providers: Providers<'a>,
}

impl<'a> VolumeSnapshotStage<'a> {
    pub fn new(providers: Providers<'a>) -> Self {
        Self { providers }
    }

    pub async fn run(&self, ctx: &CaseContext) -> Result<StageReport<VolumeSnapshotDetail>> {
        let timestamp = ctx.stage_timestamp();

        info!(target_id = %ctx.target_id(), case_id = %ctx.case_id(), "starting volume snapshots");

        let description = self.providers.resources.describe(ctx.target_id()).await?;
        if description.volumes.is_empty() {
            return Err(CaselockError::NoResourceFound {
                target_id: ctx.target_id().to_string(),
                what: "attached volumes".to_string(),
            });
        }

        let mut snapshots = Vec::with_capacity(description.volumes.len());
        for volume in &description.volumes {
            let mut tags = BTreeMap::new();
            tags.insert(evidence::TAG_CASE_ID.to_string(), ctx.case_id().to_string());
            tags.insert("InstanceId".to_string(), ctx.target_id().to_string());
            tags.insert("DeviceName".to_string(), volume.device_name.clone());
            tags.insert(
                evidence::TAG_PURPOSE.to_string(),
                evidence::PURPOSE_FORENSICS.to_string(),
            );

            let snapshot_description = format!(
                "Forensics snapshot - {} - {} - {}",
                ctx.case_id(),
                ctx.target_id(),
                volume.device_name
            );

            info!(volume_id = %volume.volume_id, device_name = %volume.device_name, "creating snapshot");
            let created = self
                .providers
                .resources
                .create_snapshot(&volume.volume_id, &snapshot_description, &tags)
                .await?;
            info!(snapshot_id = %created.snapshot_id, state = %created.state, "snapshot requested");

            snapshots.push(SnapshotRecord {
                snapshot_id: created.snapshot_id,
                volume_id: volume.volume_id.clone(),
                device_name: volume.device_name.clone(),
                state: created.state,
                start_time: created.start_time,
            });
        }

        let body = serde_json::json!({
            "case_id": ctx.case_id(),
            "target_id": ctx.target_id(),
            "timestamp": timestamp,
            "snapshots": &snapshots,
            "total_volumes": description.volumes.len(),
        });
        let record = EvidenceRecord::json(ctx, EvidenceType::EbsSnapshot, &timestamp, body);
        let locator = self.providers.store.put(&record).await?;

        Ok(StageReport {
            status: StageStatus::Success,
            case_id: ctx.case_id().to_string(),
            target_id: ctx.target_id().to_string(),
            evidence_type: EvidenceType::EbsSnapshot,
            evidence_address: locator,
            timestamp,
            detail: VolumeSnapshotDetail {
                total_volumes: snapshots.len(),
                snapshots,
            },
        })
    }
}
