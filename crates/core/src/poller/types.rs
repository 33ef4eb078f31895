//! Types for job polling.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

use crate::config::PollConfig;
use crate::job::{JobSnapshot, JobStatus};
use crate::transport::TransportError;

/// Errors that can occur while waiting for a job.
#[derive(Debug, Error)]
pub enum PollError {
    /// The job reported `failed`.
    #[error("job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    /// The deadline passed before a terminal state was observed.
    #[error("job {job_id} not finished after {}s (last status: {})", .deadline.as_secs(), .last_status.map(|s| s.as_str()).unwrap_or("unknown"))]
    Timeout {
        job_id: String,
        deadline: Duration,
        last_status: Option<JobStatus>,
    },

    /// The wait was cancelled by the caller.
    #[error("polling job {job_id} cancelled")]
    Cancelled { job_id: String },

    /// A status request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Progress update emitted when status or progress changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressObservation {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    /// Time since polling started.
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

/// Poller settings.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between two status checks.
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

impl From<&PollConfig> for PollerConfig {
    fn from(config: &PollConfig) -> Self {
        Self {
            interval: config.interval(),
        }
    }
}

/// Client-local state of one wait. Dropped once the poll returns.
#[derive(Debug)]
pub struct PollSession {
    pub job_id: String,
    pub started_at: Instant,
    pub deadline: Duration,
    pub last_status: Option<JobStatus>,
    pub last_progress: Option<u32>,
}

impl PollSession {
    pub fn new(job_id: impl Into<String>, deadline: Duration) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Instant::now(),
            deadline,
            last_status: None,
            last_progress: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.deadline
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_sub(self.elapsed())
    }

    /// Record a snapshot; returns an observation if status or progress changed.
    pub fn observe(&mut self, snapshot: &JobSnapshot) -> Option<ProgressObservation> {
        let changed = self.last_status != Some(snapshot.status)
            || self.last_progress != Some(snapshot.progress);
        self.last_status = Some(snapshot.status);
        self.last_progress = Some(snapshot.progress);

        changed.then(|| ProgressObservation {
            job_id: self.job_id.clone(),
            status: snapshot.status,
            progress: snapshot.progress,
            current_step: snapshot.current_step.clone(),
            elapsed: self.elapsed(),
        })
    }

    pub fn timeout_error(&self) -> PollError {
        PollError::Timeout {
            job_id: self.job_id.clone(),
            deadline: self.deadline,
            last_status: self.last_status,
        }
    }
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
