//! Scripted provider fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use caselock::InMemoryEvidenceStore;
use caselock::error::{CaselockError, Result};
use caselock::provider::{
    AttachedVolume, JobId, JobPoll, JobStatus, PowerState, RemoteCommandChannel,
    ResourceDescription, ResourceManager, SnapshotInfo, StopTransition,
};
use caselock::stages::Providers;

pub struct Submission {
    pub target_id: String,
    pub commands: Vec<String>,
    pub timeout: Duration,
}

/// Remote channel replaying one scripted poll sequence per submission. The
/// last entry of a sequence repeats, so terminal statuses stay terminal.
#[derive(Default)]
pub struct ScriptedChannel {
    scripts: Mutex<VecDeque<Vec<JobPoll>>>,
    active: Mutex<VecDeque<JobPoll>>,
    pub submissions: Mutex<Vec<Submission>>,
    job_counter: AtomicUsize,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_script(&self, polls: Vec<JobPoll>) {
        self.scripts.lock().push_back(polls);
    }

    pub fn push_success(&self, stdout: &str) {
        self.push_script(vec![
            JobPoll::status(JobStatus::InProgress),
            JobPoll {
                status: JobStatus::Succeeded,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ]);
    }

    pub fn push_failure(&self, stderr: &str) {
        self.push_script(vec![JobPoll {
            status: JobStatus::Failed,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }]);
    }
}

#[async_trait]
impl RemoteCommandChannel for ScriptedChannel {
    async fn submit(
        &self,
        target_id: &str,
        commands: &[String],
        timeout: Duration,
    ) -> Result<JobId> {
        self.submissions.lock().push(Submission {
            target_id: target_id.to_string(),
            commands: commands.to_vec(),
            timeout,
        });

        let script = self
            .scripts
            .lock()
            .pop_front()
            .unwrap_or_else(|| vec![JobPoll::status(JobStatus::Succeeded)]);
        *self.active.lock() = script.into();

        let n = self.job_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(JobId::new(format!("job-{n:04}")))
    }

    async fn poll(&self, _job_id: &JobId, _target_id: &str) -> Result<JobPoll> {
        let mut active = self.active.lock();
        if active.len() > 1 {
            Ok(active.pop_front().expect("non-empty script"))
        } else {
            Ok(active
                .front()
                .cloned()
                .unwrap_or_else(|| JobPoll::status(JobStatus::InProgress)))
        }
    }
}

/// Resource backend with a fixed description, a scripted power-state
/// sequence, and recorded snapshot/stop/tag calls.
pub struct ScriptedResources {
    description: Mutex<ResourceDescription>,
    power_states: Mutex<VecDeque<PowerState>>,
    failing_volume: Mutex<Option<String>>,
    snapshot_counter: AtomicUsize,
    pub snapshot_tags: Mutex<Vec<BTreeMap<String, String>>>,
    pub stop_requests: AtomicUsize,
    pub tag_calls: Mutex<Vec<BTreeMap<String, String>>>,
}

impl ScriptedResources {
    pub fn with_volumes(count: usize) -> Self {
        let volumes = (0..count)
            .map(|i| AttachedVolume {
                volume_id: format!("vol-{i:04}"),
                device_name: format!("/dev/xvd{}", (b'a' + i as u8) as char),
            })
            .collect();

        let mut tags = BTreeMap::new();
        tags.insert("Name".to_string(), "web-1".to_string());

        Self {
            description: Mutex::new(ResourceDescription {
                attributes: serde_json::json!({
                    "instance_type": "t3.micro",
                    "image_id": "ami-0abc1234",
                    "availability_zone": "us-east-1a",
                }),
                tags,
                security_groups: vec![serde_json::json!({"group_id": "sg-0123"})],
                network_interfaces: vec![serde_json::json!({"interface_id": "eni-0456"})],
                volumes,
                power_state: PowerState::Running,
            }),
            power_states: Mutex::new(VecDeque::from([PowerState::Running])),
            failing_volume: Mutex::new(None),
            snapshot_counter: AtomicUsize::new(0),
            snapshot_tags: Mutex::new(Vec::new()),
            stop_requests: AtomicUsize::new(0),
            tag_calls: Mutex::new(Vec::new()),
        }
    }

    /// Power states served in order; the last one repeats.
    pub fn set_power_sequence(&self, states: Vec<PowerState>) {
        *self.power_states.lock() = states.into();
    }

    pub fn fail_snapshot_for(&self, volume_id: &str) {
        *self.failing_volume.lock() = Some(volume_id.to_string());
    }

    pub fn snapshots_created(&self) -> usize {
        self.snapshot_counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceManager for ScriptedResources {
    async fn describe(&self, _target_id: &str) -> Result<ResourceDescription> {
        Ok(self.description.lock().clone())
    }

    async fn create_snapshot(
        &self,
        volume_id: &str,
        _description: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<SnapshotInfo> {
        if self.failing_volume.lock().as_deref() == Some(volume_id) {
            return Err(CaselockError::Collaborator(format!(
                "snapshot creation failed for {volume_id}"
            )));
        }

        let n = self.snapshot_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot_tags.lock().push(tags.clone());
        Ok(SnapshotInfo {
            snapshot_id: format!("snap-{n:04}"),
            state: "pending".to_string(),
            start_time: Utc::now(),
        })
    }

    async fn request_stop(&self, _target_id: &str) -> Result<StopTransition> {
        self.stop_requests.fetch_add(1, Ordering::SeqCst);
        Ok(StopTransition {
            previous_state: PowerState::Running,
            current_state: PowerState::Stopping,
        })
    }

    async fn power_state(&self, _target_id: &str) -> Result<PowerState> {
        let mut states = self.power_states.lock();
        if states.len() > 1 {
            Ok(states.pop_front().expect("non-empty sequence"))
        } else {
            Ok(*states.front().unwrap_or(&PowerState::Running))
        }
    }

    async fn tag(&self, _target_id: &str, tags: &BTreeMap<String, String>) -> Result<()> {
        self.tag_calls.lock().push(tags.clone());
        Ok(())
    }
}

pub fn providers<'a>(
    channel: &'a ScriptedChannel,
    resources: &'a ScriptedResources,
    store: &'a InMemoryEvidenceStore,
) -> Providers<'a> {
    Providers {
        remote: channel,
        resources,
        store,
    }
}

/// Opt-in test logging: `RUST_LOG=caselock=debug cargo test -- --nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
