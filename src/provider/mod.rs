//! Collaborator traits the orchestration core consumes.
//!
//! Everything provider-specific (credential wiring, SDK calls, the actual
//! remote-command transport) lives behind these traits so the engine can
//! drive any remote-execution and resource-management backend.

mod fs_store;
mod memory;
mod remote;
mod resource;
mod store;

pub use fs_store::FsEvidenceStore;
pub use memory::InMemoryEvidenceStore;
pub use remote::{JobId, JobPoll, JobStatus, RemoteCommandChannel};
pub use resource::{
    AttachedVolume, PowerState, ResourceDescription, ResourceManager, SnapshotInfo, StopTransition,
};
pub use store::EvidenceStore;
