use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote job service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service base URL (e.g., "http://localhost:3000")
    pub base_url: String,
    /// Shared HMAC secret. Usually injected via `VIDGEN_SERVICE__SECRET`.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Per-call timeouts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    /// Bound on control calls (health, submit, status) in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// TCP connect bound in seconds (default: 10)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Maximum silence between two download chunks in seconds (default: 60)
    #[serde(default = "default_download_inactivity")]
    pub download_inactivity_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            download_inactivity_secs: default_download_inactivity(),
        }
    }
}

impl TimeoutConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn download_inactivity(&self) -> Duration {
        Duration::from_secs(self.download_inactivity_secs)
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_download_inactivity() -> u64 {
    60
}

/// Job polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    /// Delay between two status checks in milliseconds (default: 5000)
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    /// Give up waiting for a terminal state after this many seconds (default: 300)
    #[serde(default = "default_poll_deadline")]
    pub deadline_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            deadline_secs: default_poll_deadline(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

fn default_poll_interval() -> u64 {
    5000 // 5 seconds
}

fn default_poll_deadline() -> u64 {
    300 // 5 minutes
}

/// Artifact output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory relative artifact destinations are resolved against
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Sanitized config for display (secret redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub service: SanitizedServiceConfig,
    pub timeouts: TimeoutConfig,
    pub poll: PollConfig,
    pub output: OutputConfig,
}

/// Sanitized service config (secret hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedServiceConfig {
    pub base_url: String,
    pub secret_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            service: SanitizedServiceConfig {
                base_url: config.service.base_url.clone(),
                secret_configured: config
                    .service
                    .secret
                    .as_ref()
                    .is_some_and(|s| !s.is_empty()),
            },
            timeouts: config.timeouts.clone(),
            poll: config.poll.clone(),
            output: config.output.clone(),
        }
    }
}
