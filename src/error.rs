use thiserror::Error;

use crate::provider::JobStatus;

#[derive(Error, Debug)]
pub enum CaselockError {
    /// The remote batch reached a terminal status other than success, or a
    /// host-side precondition check failed the batch with a non-zero exit.
    #[error("remote execution ended with status {status}: {stderr}")]
    ExecutionFailure { status: JobStatus, stderr: String },

    /// The remote channel never reported a terminal status within the outer
    /// deadline. Distinct from the job's own timeout, which the channel
    /// reports as a terminal status.
    #[error("remote channel reported no terminal status for job {job_id} after {elapsed_secs}s")]
    ChannelStalled { job_id: String, elapsed_secs: u64 },

    #[error(
        "{resource_id} did not reach state {target} after {attempts} poll(s), last observed {last_observed}"
    )]
    WaitTimeout {
        resource_id: String,
        target: String,
        attempts: u32,
        last_observed: String,
    },

    #[error("no {what} found for {target_id}")]
    NoResourceFound { target_id: String, what: String },

    #[error("evidence store rejected {address}: {message}")]
    StoreFailure { address: String, message: String },

    #[error("provider call failed: {0}")]
    Collaborator(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CaselockError>;
