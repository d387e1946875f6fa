use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Discrete power state of a managed host resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerState {
    Pending,
    Running,
    ShuttingDown,
    Stopping,
    Stopped,
    Terminated,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Terminated => "terminated",
        }
    }

    /// True if `target` is unreachable from this state. A terminated resource
    /// never transitions again.
    pub fn precludes(&self, target: PowerState) -> bool {
        *self == Self::Terminated && target != Self::Terminated
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One block-storage volume attached to the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedVolume {
    pub volume_id: String,
    pub device_name: String,
}

/// Inventory snapshot of the target resource as the provider reports it.
/// `attributes`, security groups and network interfaces stay provider-shaped
/// JSON: they are evidence payload, not engine input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescription {
    pub attributes: Value,
    pub tags: BTreeMap<String, String>,
    pub security_groups: Vec<Value>,
    pub network_interfaces: Vec<Value>,
    pub volumes: Vec<AttachedVolume>,
    pub power_state: PowerState,
}

/// Provider acknowledgement for an asynchronous snapshot-create request.
/// `state` is the provider's vocabulary (`pending` until completion).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub snapshot_id: String,
    pub state: String,
    pub start_time: DateTime<Utc>,
}

/// States reported when a stop request is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopTransition {
    pub previous_state: PowerState,
    pub current_state: PowerState,
}

/// Resource-management operations the stages consume.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    async fn describe(&self, target_id: &str) -> Result<ResourceDescription>;

    /// Issues an asynchronous snapshot-create request; returns without
    /// waiting for completion.
    async fn create_snapshot(
        &self,
        volume_id: &str,
        description: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<SnapshotInfo>;

    async fn request_stop(&self, target_id: &str) -> Result<StopTransition>;

    async fn power_state(&self, target_id: &str) -> Result<PowerState>;

    async fn tag(&self, target_id: &str, tags: &BTreeMap<String, String>) -> Result<()>;
}
