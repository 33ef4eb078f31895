//! Orchestrator implementation.
//!
//! One run drives a single job through health, submit, poll and fetch.
//! Nothing is retried; the first failure ends the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{validate_config, Config, ConfigError};
use crate::fetcher::{ArtifactFetcher, DownloadObserver, DownloadProgress, FetcherConfig, StreamingFetcher};
use crate::job::{GenerateVideoRequest, HealthReport, JobApi, JobSnapshot, SubmitResponse};
use crate::poller::{IntervalPoller, JobPoller, PollerConfig, ProgressObservation, ProgressObserver};
use crate::signer::Signer;
use crate::transport::{HttpTransport, TransportConfig};

use super::config::OrchestratorConfig;
use super::types::{OrchestratorError, RunReport};

/// Receives stage events of a run. Every method defaults to a no-op.
pub trait RunObserver: Send + Sync {
    fn on_health(&self, _report: &HealthReport) {}

    fn on_submitted(&self, _response: &SubmitResponse) {}

    fn on_job_progress(&self, _observation: &ProgressObservation) {}

    fn on_download_progress(&self, _progress: &DownloadProgress) {}
}

/// Observer that ignores all events.
pub struct NoopRunObserver;

impl RunObserver for NoopRunObserver {}

struct JobProgressForwarder<'a>(&'a dyn RunObserver);

impl ProgressObserver for JobProgressForwarder<'_> {
    fn on_progress(&self, observation: &ProgressObservation) {
        self.0.on_job_progress(observation);
    }
}

struct DownloadProgressForwarder<'a>(&'a dyn RunObserver);

impl DownloadObserver for DownloadProgressForwarder<'_> {
    fn on_download_progress(&self, progress: &DownloadProgress) {
        self.0.on_download_progress(progress);
    }
}

/// Runs one job end to end.
pub struct Orchestrator {
    config: OrchestratorConfig,
    api: JobApi,
    poller: Arc<dyn JobPoller>,
    fetcher: Arc<dyn ArtifactFetcher>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        api: JobApi,
        poller: Arc<dyn JobPoller>,
        fetcher: Arc<dyn ArtifactFetcher>,
    ) -> Self {
        Self {
            config,
            api,
            poller,
            fetcher,
        }
    }

    /// Wire up the HTTP-backed components from validated configuration.
    ///
    /// Fails with a configuration error before any network activity.
    pub fn from_config(config: &Config) -> Result<Self, OrchestratorError> {
        validate_config(config)?;

        let secret = config.service.secret.clone().unwrap_or_default();
        let signer =
            Signer::new(secret).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        let transport = HttpTransport::new(TransportConfig::from_config(config)?, signer)
            .map_err(|e| OrchestratorError::Setup(e.to_string()))?;
        let api = JobApi::new(Arc::new(transport));

        let poller = IntervalPoller::new(api.clone(), PollerConfig::from(&config.poll));
        let fetcher = StreamingFetcher::new(FetcherConfig::from(&config.timeouts))
            .map_err(|e| OrchestratorError::Setup(e.to_string()))?;

        Ok(Self::new(
            OrchestratorConfig::from(config),
            api,
            Arc::new(poller),
            Arc::new(fetcher),
        ))
    }

    pub fn api(&self) -> &JobApi {
        &self.api
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Generate a video and download it.
    ///
    /// `destination` may be absolute, relative to the output directory, or
    /// omitted (`<jobId>.mp4` in the output directory).
    pub async fn run(
        &self,
        request: &GenerateVideoRequest,
        destination: Option<&Path>,
        observer: &dyn RunObserver,
        cancel: &CancellationToken,
    ) -> Result<RunReport, OrchestratorError> {
        let started = Instant::now();

        let health = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
            result = self.api.health() => result.map_err(OrchestratorError::Unreachable)?,
        };
        info!(
            service = %health.service,
            version = %health.version,
            current_jobs = health.worker.current_jobs,
            "Job service healthy"
        );
        if !health.worker.running {
            warn!("Job service worker is not running; the job may never start");
        }
        observer.on_health(&health);

        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
            result = self.api.submit(request) => result.map_err(OrchestratorError::Submit)?,
        };
        observer.on_submitted(&submitted);
        let job_id = submitted.job_id.clone();

        let snapshot = self
            .poller
            .poll(
                &job_id,
                self.config.poll_deadline(),
                &JobProgressForwarder(observer),
                cancel,
            )
            .await?;

        let url = self.download_url(&job_id, &snapshot)?;
        let path = self.destination_for(&job_id, destination);
        debug!(job_id = %job_id, url = %url, path = %path.display(), "Fetching artifact");

        let bytes = self
            .fetcher
            .fetch(&url, &path, &DownloadProgressForwarder(observer), cancel)
            .await?;

        if let Some(reported) = snapshot.file_size.filter(|size| *size != bytes) {
            warn!(
                job_id = %job_id,
                reported_bytes = reported,
                received_bytes = bytes,
                "Artifact size differs from the size the job reported"
            );
        }

        let report = RunReport {
            job_id,
            artifact_path: path,
            artifact_bytes: bytes,
            elapsed: started.elapsed(),
            duration: snapshot.duration,
            resolution: snapshot.resolution,
            expires_at: snapshot.expires_at,
        };
        info!(
            job_id = %report.job_id,
            path = %report.artifact_path.display(),
            bytes = report.artifact_bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Run complete"
        );
        Ok(report)
    }

    fn download_url(&self, job_id: &str, snapshot: &JobSnapshot) -> Result<String, OrchestratorError> {
        let raw = snapshot
            .download_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| OrchestratorError::MissingDownloadUrl {
                job_id: job_id.to_string(),
            })?;

        // Expired artifacts are still attempted; the server decides.
        if snapshot.is_expired_at(Utc::now()) {
            warn!(
                job_id = job_id,
                expires_at = ?snapshot.expires_at,
                "Artifact has passed its expiry; download may fail"
            );
        }

        self.api
            .resolve_url(raw)
            .map_err(OrchestratorError::InvalidDownloadUrl)
    }

    /// Where the artifact for `job_id` is written.
    pub fn destination_for(&self, job_id: &str, requested: Option<&Path>) -> PathBuf {
        match requested {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.config.output_dir.join(path),
            None => self.config.output_dir.join(format!(
                "{}.{}",
                file_stem_for(job_id),
                self.config.file_extension
            )),
        }
    }
}

/// Job ids come from the server; keep only path-safe characters.
fn file_stem_for(job_id: &str) -> String {
    let stem: String = job_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "artifact".to_string()
    } else {
        stem
    }
}
