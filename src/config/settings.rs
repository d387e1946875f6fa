use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{CaselockError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaselockConfig {
    pub remote: RemoteConfig,
    pub capture: CaptureConfig,
    pub containment: ContainmentConfig,
    pub pipeline: PipelineConfig,
}

impl CaselockConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path).await?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.remote.poll_interval_secs == 0 {
            errors.push("remote.poll_interval_secs must be greater than 0");
        }
        if self.remote.capture_timeout_secs < self.remote.poll_interval_secs {
            errors.push("remote.capture_timeout_secs must cover at least one poll interval");
        }
        if self.remote.introspect_timeout_secs == 0 {
            errors.push("remote.introspect_timeout_secs must be greater than 0");
        }
        if self.containment.poll_interval_secs == 0 {
            errors.push("containment.poll_interval_secs must be greater than 0");
        }
        if self.containment.max_attempts == 0 {
            errors.push("containment.max_attempts must be greater than 0");
        }
        if self.capture.module_dir.is_empty() {
            errors.push("capture.module_dir must not be empty");
        }
        if self.capture.dump_dir.is_empty() {
            errors.push("capture.dump_dir must not be empty");
        }
        if self.capture.upload_command.is_empty() {
            errors.push("capture.upload_command must not be empty");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CaselockError::Config(errors.join("; ")))
        }
    }
}

/// Remote-execution budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Seconds between job-status polls.
    pub poll_interval_secs: u64,
    /// Budget for the memory-capture batch. Images are RAM-sized and take
    /// minutes to write and upload.
    pub capture_timeout_secs: u64,
    /// Budget for the read-only OS introspection batch.
    pub introspect_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            capture_timeout_secs: 600,
            introspect_timeout_secs: 120,
        }
    }
}

impl RemoteConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }

    pub fn introspect_timeout(&self) -> Duration {
        Duration::from_secs(self.introspect_timeout_secs)
    }
}

/// Host-side memory acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Directory holding the capture kernel module (`*.ko`).
    pub module_dir: String,
    /// Module name as it appears in `lsmod`.
    pub module_name: String,
    /// Where the raw image is written. Must sit on a durable volume: tmpfs
    /// mounts are RAM-backed and cannot hold a RAM-sized dump.
    pub dump_dir: String,
    /// Capture format passed to the module.
    pub format: String,
    /// Command prefix used to copy the image to the evidence store locator.
    pub upload_command: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            module_dir: "/opt/LiME/src".to_string(),
            module_name: "lime".to_string(),
            dump_dir: "/var/tmp".to_string(),
            format: "lime".to_string(),
            upload_command: "aws s3 cp".to_string(),
        }
    }
}

/// Stop-and-wait settings for the containment stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainmentConfig {
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            max_attempts: 12,
        }
    }
}

impl ContainmentConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Keep running later stages after a hard stage failure instead of
    /// skipping them.
    pub continue_on_failure: bool,
}
