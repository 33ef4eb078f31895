//! Fixed-interval status poller.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::job::{JobApi, JobSnapshot, JobStatus};

use super::{JobPoller, PollError, PollSession, PollerConfig, ProgressObserver};

/// Polls `GET /job/{jobId}` every `interval` until a terminal state.
pub struct IntervalPoller {
    api: JobApi,
    config: PollerConfig,
}

impl IntervalPoller {
    pub fn new(api: JobApi, config: PollerConfig) -> Self {
        Self { api, config }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}

#[async_trait]
impl JobPoller for IntervalPoller {
    async fn poll(
        &self,
        job_id: &str,
        deadline: Duration,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<JobSnapshot, PollError> {
        let mut session = PollSession::new(job_id, deadline);
        let cancelled = || PollError::Cancelled {
            job_id: job_id.to_string(),
        };

        debug!(
            job_id = job_id,
            deadline_secs = deadline.as_secs(),
            interval_ms = self.config.interval.as_millis() as u64,
            "Polling job"
        );

        loop {
            if session.is_expired() {
                warn!(job_id = job_id, "Job did not finish before the deadline");
                return Err(session.timeout_error());
            }

            // The status call may not outlive the deadline either.
            let snapshot = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                result = tokio::time::timeout(session.remaining(), self.api.status(job_id)) => {
                    match result {
                        Ok(snapshot) => snapshot?,
                        Err(_) => return Err(session.timeout_error()),
                    }
                }
            };

            if let Some(observation) = session.observe(&snapshot) {
                observer.on_progress(&observation);
            }

            match snapshot.status {
                JobStatus::Completed => {
                    info!(
                        job_id = job_id,
                        elapsed_ms = session.elapsed().as_millis() as u64,
                        "Job completed"
                    );
                    return Ok(snapshot);
                }
                JobStatus::Failed => {
                    let reason = snapshot
                        .error
                        .unwrap_or_else(|| "job failed without a reason".to_string());
                    warn!(job_id = job_id, reason = %reason, "Job failed");
                    return Err(PollError::JobFailed {
                        job_id: job_id.to_string(),
                        reason,
                    });
                }
                JobStatus::Pending | JobStatus::Processing => {}
            }

            let wait = self.config.interval.min(session.remaining());
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
