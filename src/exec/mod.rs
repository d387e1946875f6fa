//! Remote batch execution, driven to completion by polling.

mod batch;

pub use batch::{memory_capture_batch, os_introspection_batch};

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::error::{CaselockError, Result};
use crate::provider::{JobId, JobStatus, RemoteCommandChannel};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Output of a remote batch that reached the succeeded status.
#[derive(Debug, Clone)]
pub struct RemoteResult {
    pub job_id: JobId,
    pub stdout: String,
    pub stderr: String,
}

/// Submits a command batch and polls the channel until the job reaches a
/// terminal status.
///
/// The job's own `timeout` is enforced remotely by the channel; the executor
/// additionally carries an outer deadline (timeout plus two poll intervals)
/// so a channel that never reports a terminal status cannot block the stage
/// indefinitely.
pub struct RemoteExecutor<'a> {
    channel: &'a dyn RemoteCommandChannel,
    poll_interval: Duration,
}

impl<'a> RemoteExecutor<'a> {
    pub fn new(channel: &'a dyn RemoteCommandChannel) -> Self {
        Self {
            channel,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn execute(
        &self,
        target_id: &str,
        commands: &[String],
        timeout: Duration,
    ) -> Result<RemoteResult> {
        let job_id = self.channel.submit(target_id, commands, timeout).await?;
        info!(target_id, job_id = %job_id, commands = commands.len(), "remote batch submitted");

        let deadline = timeout + self.poll_interval * 2;
        let started = Instant::now();

        loop {
            sleep(self.poll_interval).await;
            let observed = self.channel.poll(&job_id, target_id).await?;
            debug!(job_id = %job_id, status = %observed.status, "remote job polled");

            if observed.status.is_terminal() {
                if observed.status == JobStatus::Succeeded {
                    return Ok(RemoteResult {
                        job_id,
                        stdout: observed.stdout,
                        stderr: observed.stderr,
                    });
                }
                warn!(job_id = %job_id, status = %observed.status, "remote batch did not succeed");
                return Err(CaselockError::ExecutionFailure {
                    status: observed.status,
                    stderr: observed.stderr,
                });
            }

            if started.elapsed() >= deadline {
                warn!(job_id = %job_id, "remote channel stalled, abandoning poll loop");
                return Err(CaselockError::ChannelStalled {
                    job_id: job_id.to_string(),
                    elapsed_secs: started.elapsed().as_secs(),
                });
            }
        }
    }
}
