//! Mock poller for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::job::JobSnapshot;
use crate::poller::{JobPoller, PollError, ProgressObservation, ProgressObserver};

/// Mock implementation of the JobPoller trait.
///
/// Returns the configured outcome immediately. A successful snapshot is
/// reported to the observer once and kept for later polls; an error is
/// returned once. With nothing configured, polls time out.
#[derive(Debug)]
pub struct MockPoller {
    result: Arc<RwLock<Option<Result<JobSnapshot, PollError>>>>,
    /// (job id, deadline) of every poll.
    polls: Arc<RwLock<Vec<(String, Duration)>>>,
}

impl Default for MockPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPoller {
    pub fn new() -> Self {
        Self {
            result: Arc::new(RwLock::new(None)),
            polls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the outcome of the next poll.
    pub async fn set_result(&self, result: Result<JobSnapshot, PollError>) {
        *self.result.write().await = Some(result);
    }

    /// Get all recorded polls.
    pub async fn recorded_polls(&self) -> Vec<(String, Duration)> {
        self.polls.read().await.clone()
    }

    async fn take_result(&self) -> Option<Result<JobSnapshot, PollError>> {
        let mut result = self.result.write().await;
        if matches!(result.as_ref(), Some(Ok(_))) {
            return result.as_ref().and_then(|r| r.as_ref().ok().cloned()).map(Ok);
        }
        result.take()
    }
}

#[async_trait]
impl JobPoller for MockPoller {
    async fn poll(
        &self,
        job_id: &str,
        deadline: Duration,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<JobSnapshot, PollError> {
        self.polls
            .write()
            .await
            .push((job_id.to_string(), deadline));

        if cancel.is_cancelled() {
            return Err(PollError::Cancelled {
                job_id: job_id.to_string(),
            });
        }

        match self.take_result().await {
            Some(Ok(snapshot)) => {
                observer.on_progress(&ProgressObservation {
                    job_id: job_id.to_string(),
                    status: snapshot.status,
                    progress: snapshot.progress,
                    current_step: snapshot.current_step.clone(),
                    elapsed: Duration::ZERO,
                });
                Ok(snapshot)
            }
            Some(Err(e)) => Err(e),
            None => Err(PollError::Timeout {
                job_id: job_id.to_string(),
                deadline,
                last_status: None,
            }),
        }
    }
}
