//! Types for the orchestrator.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::fetcher::FetchError;
use crate::poller::PollError;
use crate::transport::TransportError;

/// Failure classes a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing secret, malformed URL, unusable settings.
    Config,
    /// No response: refused, DNS, timeout, dropped stream.
    Network,
    /// A response with a non-success status or an unusable body.
    Server,
    /// The job itself reported failure.
    JobFailed,
    /// Deadline exceeded or cancelled.
    Timeout,
    /// Local filesystem failure.
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::JobFailed => "job_failed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during a run. The first one aborts the run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A component could not be constructed.
    #[error("setup failed: {0}")]
    Setup(String),

    /// The health probe failed; nothing downstream can succeed.
    #[error("job service unreachable: {0}")]
    Unreachable(#[source] TransportError),

    /// Job submission failed.
    #[error("job submission failed: {0}")]
    Submit(#[source] TransportError),

    /// Waiting for the job failed.
    #[error(transparent)]
    Poll(#[from] PollError),

    /// The job completed without a download URL.
    #[error("job {job_id} completed without a download URL")]
    MissingDownloadUrl { job_id: String },

    /// The download URL could not be resolved.
    #[error("invalid download URL: {0}")]
    InvalidDownloadUrl(#[source] TransportError),

    /// Downloading the artifact failed.
    #[error("artifact download failed: {0}")]
    Fetch(#[from] FetchError),

    /// The run was cancelled before polling started.
    #[error("run cancelled")]
    Cancelled,
}

impl OrchestratorError {
    /// Classify this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Setup(_) => ErrorKind::Config,
            Self::Unreachable(e) | Self::Submit(e) | Self::InvalidDownloadUrl(e) => {
                transport_kind(e)
            }
            Self::Poll(e) => match e {
                PollError::JobFailed { .. } => ErrorKind::JobFailed,
                PollError::Timeout { .. } | PollError::Cancelled { .. } => ErrorKind::Timeout,
                PollError::Transport(e) => transport_kind(e),
            },
            Self::MissingDownloadUrl { .. } => ErrorKind::Server,
            Self::Fetch(e) => match e {
                FetchError::Network { .. } | FetchError::Incomplete { .. } => ErrorKind::Network,
                FetchError::Http { .. } => ErrorKind::Server,
                FetchError::Io { .. } => ErrorKind::Io,
                FetchError::Cancelled { .. } => ErrorKind::Timeout,
                FetchError::Client(_) => ErrorKind::Config,
            },
            Self::Cancelled => ErrorKind::Timeout,
        }
    }

    /// The service-reported reason for `JobFailed` errors.
    pub fn job_failure_reason(&self) -> Option<&str> {
        match self {
            Self::Poll(PollError::JobFailed { reason, .. }) => Some(reason),
            _ => None,
        }
    }
}

fn transport_kind(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Network { .. } => ErrorKind::Network,
        TransportError::Server { .. } | TransportError::Decode { .. } => ErrorKind::Server,
        TransportError::Encode { .. } | TransportError::Signing(_) | TransportError::Client(_) => {
            ErrorKind::Config
        }
    }
}

/// Final report of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub job_id: String,
    pub artifact_path: PathBuf,
    pub artifact_bytes: u64,
    /// Wall-clock time from health check to finished download.
    #[serde(rename = "elapsed_ms", with = "duration_ms")]
    pub elapsed: Duration,
    /// Video duration in seconds, as reported by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
