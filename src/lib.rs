//! caselock: orchestration core for automated incident response.
//!
//! Captures volatile memory, snapshots persistent storage, records host and
//! network metadata, and contains a compromised target. Each stage is an
//! independently invocable unit composed from three leaves: a polling
//! [`exec::RemoteExecutor`] over a remote-command channel, a bounded
//! [`waiter::StateWaiter`] over discrete resource states, and a write-once
//! [`provider::EvidenceStore`]. Provider specifics stay behind the traits in
//! [`provider`]; the engine is backend-agnostic.

pub mod case;
pub mod config;
pub mod error;
pub mod evidence;
pub mod exec;
pub mod pipeline;
pub mod provider;
pub mod stages;
pub mod waiter;

pub use case::CaseContext;
pub use config::CaselockConfig;
pub use error::{CaselockError, Result};
pub use evidence::{EvidenceBody, EvidenceRecord, EvidenceType};
pub use exec::{RemoteExecutor, RemoteResult};
pub use pipeline::{Pipeline, PipelineReport, PipelineStatus, StageKind, StageOutcome};
pub use provider::{
    EvidenceStore, FsEvidenceStore, InMemoryEvidenceStore, JobId, JobStatus, PowerState,
    RemoteCommandChannel, ResourceManager,
};
pub use stages::{
    ContainmentStage, MemoryCaptureStage, MetadataCollectionStage, Providers, StageReport,
    StageStatus, VolumeSnapshotStage,
};
pub use waiter::StateWaiter;
