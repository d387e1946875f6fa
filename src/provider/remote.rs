use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier the channel hands back for one submitted batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a remote-command job. Terminal states are final; retrying is
/// a caller decision, never the job's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a submitted job.
#[derive(Debug, Clone)]
pub struct JobPoll {
    pub status: JobStatus,
    pub stdout: String,
    pub stderr: String,
}

impl JobPoll {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Remote-command transport: submits a batch of shell-level instructions to a
/// target host and reports job status on demand. The channel enforces the
/// job's own `timeout` remotely and reports its firing as a terminal status.
#[async_trait]
pub trait RemoteCommandChannel: Send + Sync {
    async fn submit(
        &self,
        target_id: &str,
        commands: &[String],
        timeout: Duration,
    ) -> Result<JobId>;

    async fn poll(&self, job_id: &JobId, target_id: &str) -> Result<JobPoll>;
}
