use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::job::JobSnapshot;

use super::types::{PollError, ProgressObservation};

/// Receives one observation per distinct (status, progress) pair.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, observation: &ProgressObservation);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressObservation) + Send + Sync,
{
    fn on_progress(&self, observation: &ProgressObservation) {
        self(observation)
    }
}

/// Observer that discards everything.
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _observation: &ProgressObservation) {}
}

#[async_trait]
pub trait JobPoller: Send + Sync {
    /// Wait until `job_id` reaches a terminal state.
    ///
    /// Returns the completed snapshot, or fails with `JobFailed` when the job
    /// reports failure, `Timeout` once `deadline` has elapsed, and
    /// `Cancelled` when `cancel` fires.
    async fn poll(
        &self,
        job_id: &str,
        deadline: Duration,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<JobSnapshot, PollError>;
}
