//! Consolidated host and resource metadata collection.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Providers, StageReport, StageStatus};
use crate::case::CaseContext;
use crate::config::CaselockConfig;
use crate::error::Result;
use crate::evidence::{EvidenceRecord, EvidenceType};
use crate::exec::{RemoteExecutor, os_introspection_batch};

/// Outcome of the best-effort OS introspection batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsInfo {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OsInfo {
    fn captured(stdout: String, stderr: String) -> Self {
        Self {
            status: "succeeded".to_string(),
            stdout: Some(stdout),
            stderr: Some(stderr),
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            stdout: None,
            stderr: None,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataDetail {
    pub os_info_status: String,
}

/// Gathers the provider's inventory of the target, merges it with the OS
/// introspection batch, and persists one consolidated record.
///
/// The introspection batch is best-effort: partial metadata still has value,
/// so its failure degrades to `os_info.status = "error"` instead of aborting
/// the stage. This is the only stage that records a sub-operation failure
/// rather than propagating it.
pub struct MetadataCollectionStage<'a> {
    providers: Providers<'a>,
    config: &'a CaselockConfig,
}

impl<'a> MetadataCollectionStage<'a> {
    pub fn new(providers: Providers<'a>, config: &'a CaselockConfig) -> Self {
        Self { providers, config }
    }

    pub async fn run(&self, ctx: &CaseContext) -> Result<StageReport<MetadataDetail>> {
        let timestamp = ctx.stage_timestamp();

        info!(target_id = %ctx.target_id(), case_id = %ctx.case_id(), "collecting metadata");

        let description = self.providers.resources.describe(ctx.target_id()).await?;

        let executor = RemoteExecutor::new(self.providers.remote)
            .with_poll_interval(self.config.remote.poll_interval());
        let os_info = match executor
            .execute(
                ctx.target_id(),
                &os_introspection_batch(),
                self.config.remote.introspect_timeout(),
            )
            .await
        {
            Ok(result) => OsInfo::captured(result.stdout, result.stderr),
            Err(e) => {
                warn!(error = %e, "OS introspection failed, recording degraded metadata");
                OsInfo::error(e.to_string())
            }
        };

        let body = serde_json::json!({
            "case_id": ctx.case_id(),
            "target_id": ctx.target_id(),
            "collection_timestamp": timestamp,
            "attributes": description.attributes,
            "resource_tags": description.tags,
            "security_groups": description.security_groups,
            "network_interfaces": description.network_interfaces,
            "volumes": description.volumes,
            "os_info": &os_info,
        });
        let record = EvidenceRecord::json(ctx, EvidenceType::InstanceMetadata, &timestamp, body);
        let locator = self.providers.store.put(&record).await?;

        info!(address = %locator, os_info_status = %os_info.status, "metadata persisted");

        Ok(StageReport {
            status: StageStatus::Success,
            case_id: ctx.case_id().to_string(),
            target_id: ctx.target_id().to_string(),
            evidence_type: EvidenceType::InstanceMetadata,
            evidence_address: locator,
            timestamp,
            detail: MetadataDetail {
                os_info_status: os_info.status,
            },
        })
    }
}
