//! Testing utilities and mock implementations.
//!
//! Mocks stand in for every seam of the orchestrator, so runs can be tested
//! without a job service.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidgen_core::testing::{fixtures, MockFetcher, MockPoller, MockTransport};
//!
//! let transport = Arc::new(MockTransport::new());
//! transport.push_response("/health", fixtures::health_body()).await;
//!
//! let poller = Arc::new(MockPoller::new());
//! poller.set_result(Ok(fixtures::completed_snapshot("job-1", "/d/1.mp4"))).await;
//! ```

mod mock_fetcher;
mod mock_poller;
mod mock_transport;

use std::sync::Mutex;

pub use mock_fetcher::{MockFetcher, RecordedFetch};
pub use mock_poller::MockPoller;
pub use mock_transport::{MockTransport, RecordedRequest};

use crate::fetcher::{DownloadObserver, DownloadProgress};
use crate::orchestrator::RunObserver;
use crate::poller::{ProgressObservation, ProgressObserver};

/// Observer that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    observations: Mutex<Vec<ProgressObservation>>,
    downloads: Mutex<Vec<DownloadProgress>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Job progress observations, in order.
    pub fn observations(&self) -> Vec<ProgressObservation> {
        self.observations
            .lock()
            .map(|o| o.clone())
            .unwrap_or_default()
    }

    /// Download progress reports, in order.
    pub fn downloads(&self) -> Vec<DownloadProgress> {
        self.downloads
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, observation: &ProgressObservation) {
        if let Ok(mut observations) = self.observations.lock() {
            observations.push(observation.clone());
        }
    }
}

impl DownloadObserver for RecordingObserver {
    fn on_download_progress(&self, progress: &DownloadProgress) {
        if let Ok(mut downloads) = self.downloads.lock() {
            downloads.push(*progress);
        }
    }
}

impl RunObserver for RecordingObserver {
    fn on_job_progress(&self, observation: &ProgressObservation) {
        self.on_progress(observation);
    }

    fn on_download_progress(&self, progress: &DownloadProgress) {
        DownloadObserver::on_download_progress(self, progress);
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::job::{GenerateVideoRequest, JobSnapshot, JobStatus};

    /// A generation request with reasonable defaults.
    pub fn generate_request() -> GenerateVideoRequest {
        GenerateVideoRequest {
            theme: "dark".to_string(),
            profile_photo_url: "https://pbs.example.com/jack.jpg".to_string(),
            profile_name: "Jack".to_string(),
            username: "jack".to_string(),
            tweet_body: "just setting up my twttr".to_string(),
        }
    }

    /// Body of a healthy `GET /health` response.
    pub fn health_body() -> Value {
        json!({
            "service": "video-generator",
            "version": "1.0.0",
            "uptime": 3600.5,
            "worker": {
                "running": true,
                "currentJobs": 0,
                "maxConcurrentJobs": 2
            },
            "jobs": {
                "pending": 0,
                "processing": 0,
                "completed": 12,
                "failed": 1
            }
        })
    }

    /// A completed job pointing at `download_url`.
    pub fn completed_snapshot(job_id: &str, download_url: &str) -> JobSnapshot {
        JobSnapshot {
            job_id: job_id.to_string(),
            status: JobStatus::Completed,
            progress: 100,
            current_step: None,
            error: None,
            download_url: Some(download_url.to_string()),
            file_size: None,
            duration: Some(12.5),
            resolution: Some("1080x1920".to_string()),
            expires_at: None,
        }
    }

    /// Wire form of [`completed_snapshot`].
    pub fn completed_body(job_id: &str, download_url: &str) -> Value {
        json!({
            "jobId": job_id,
            "status": "completed",
            "progress": 100,
            "downloadUrl": download_url,
            "duration": 12.5,
            "resolution": "1080x1920"
        })
    }
}
