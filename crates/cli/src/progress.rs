//! Progress reporting through the log.

use std::sync::Mutex;

use tracing::info;

use vidgen_core::{DownloadProgress, HealthReport, ProgressObservation, RunObserver, SubmitResponse};

/// Download progress is logged every this many percent.
const DOWNLOAD_LOG_STEP: u64 = 10;

/// Logs each stage of a run.
#[derive(Default)]
pub struct LogObserver {
    /// Last logged download bucket.
    download_bucket: Mutex<Option<u64>>,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `progress` crossed into a new bucket since the last log line.
    fn should_log(&self, progress: &DownloadProgress) -> bool {
        let bucket = match progress.percent() {
            Some(pct) => pct as u64 / DOWNLOAD_LOG_STEP,
            // Unknown size: one line per 8 MiB.
            None => progress.received_bytes / (8 * 1024 * 1024),
        };
        match self.download_bucket.lock() {
            Ok(mut last) if *last != Some(bucket) => {
                *last = Some(bucket);
                true
            }
            _ => false,
        }
    }
}

impl RunObserver for LogObserver {
    fn on_health(&self, report: &HealthReport) {
        info!(
            service = %report.service,
            version = %report.version,
            worker_running = report.worker.running,
            "Service is up"
        );
    }

    fn on_submitted(&self, response: &SubmitResponse) {
        info!(job_id = %response.job_id, status = %response.status, "Job accepted");
    }

    fn on_job_progress(&self, observation: &ProgressObservation) {
        info!(
            job_id = %observation.job_id,
            status = %observation.status,
            progress = observation.progress,
            step = observation.current_step.as_deref().unwrap_or("-"),
            elapsed_s = observation.elapsed.as_secs(),
            "Job progress"
        );
    }

    fn on_download_progress(&self, progress: &DownloadProgress) {
        if self.should_log(progress) {
            info!(
                received_bytes = progress.received_bytes,
                expected_bytes = ?progress.expected_bytes,
                percent = ?progress.percent().map(|p| p.round()),
                "Downloading"
            );
        }
    }
}
