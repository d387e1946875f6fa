//! The four per-stage control flows of the response pipeline.
//!
//! Each stage is independently invocable and composed from the same three
//! leaves: [`crate::exec::RemoteExecutor`], [`crate::waiter::StateWaiter`]
//! and the [`crate::provider::EvidenceStore`]. Stages share one uniform
//! report shape so an external trigger can chain them or short-circuit on a
//! non-success status.

mod containment;
mod memory;
mod metadata;
mod snapshot;

pub use containment::{ContainmentDetail, ContainmentStage, StopReport};
pub use memory::{MemoryCaptureDetail, MemoryCaptureStage};
pub use metadata::{MetadataCollectionStage, MetadataDetail, OsInfo};
pub use snapshot::{SnapshotRecord, VolumeSnapshotDetail, VolumeSnapshotStage};

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceType;
use crate::provider::{EvidenceStore, RemoteCommandChannel, ResourceManager};

/// Collaborators every stage runs against, passed explicitly instead of
/// living in process-global clients.
#[derive(Clone, Copy)]
pub struct Providers<'a> {
    pub remote: &'a dyn RemoteCommandChannel,
    pub resources: &'a dyn ResourceManager,
    pub store: &'a dyn EvidenceStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Failed,
}

/// Uniform result shape returned by every stage: the common identity fields
/// plus flattened stage-specific detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport<D> {
    pub status: StageStatus,
    pub case_id: String,
    pub target_id: String,
    pub evidence_type: EvidenceType,
    /// Locator of the evidence this stage produced (or, for memory capture,
    /// the destination the remote batch uploaded to).
    pub evidence_address: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub detail: D,
}
