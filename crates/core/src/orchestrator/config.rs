//! Orchestrator configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Configuration for a single orchestrated run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// How long to wait for the job to reach a terminal state (milliseconds).
    #[serde(default = "default_deadline")]
    pub poll_deadline_ms: u64,

    /// Directory relative destinations are resolved against.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Extension used for the default `<jobId>.<ext>` file name.
    #[serde(default = "default_extension")]
    pub file_extension: String,
}

fn default_deadline() -> u64 {
    300_000 // 5 minutes
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_extension() -> String {
    "mp4".to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_deadline_ms: default_deadline(),
            output_dir: default_output_dir(),
            file_extension: default_extension(),
        }
    }
}

impl OrchestratorConfig {
    pub fn poll_deadline(&self) -> Duration {
        Duration::from_millis(self.poll_deadline_ms)
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            poll_deadline_ms: config.poll.deadline().as_millis() as u64,
            output_dir: config.output.dir.clone(),
            ..Default::default()
        }
    }
}
