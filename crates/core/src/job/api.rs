//! Typed wrapper over the job service endpoints.

use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info};

use crate::transport::{Method, Transport, TransportError};

use super::types::{GenerateVideoRequest, HealthReport, JobSnapshot, SubmitResponse};

/// Typed access to `/health`, `/generate-video` and `/job/{jobId}`.
#[derive(Clone)]
pub struct JobApi {
    transport: Arc<dyn Transport>,
}

impl JobApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Unsigned health probe.
    pub async fn health(&self) -> Result<HealthReport, TransportError> {
        let response = self.transport.send(Method::Get, "/health", None).await?;
        response.json()
    }

    /// Submit a signed generation request.
    pub async fn submit(
        &self,
        request: &GenerateVideoRequest,
    ) -> Result<SubmitResponse, TransportError> {
        let body = serde_json::to_value(request)
            .map_err(|e| TransportError::encode("/generate-video", e.to_string()))?;

        let response = self
            .transport
            .send(Method::Post, "/generate-video", Some(&body))
            .await?;
        let endpoint = response.endpoint.clone();
        let submitted: SubmitResponse = response.json()?;

        if submitted.job_id.is_empty() {
            return Err(TransportError::decode(endpoint, "empty jobId in response"));
        }

        info!(job_id = %submitted.job_id, status = %submitted.status, "Job submitted");
        Ok(submitted)
    }

    /// Fetch the current snapshot of a job (unsigned).
    pub async fn status(&self, job_id: &str) -> Result<JobSnapshot, TransportError> {
        let path = format!("/job/{}", urlencoding::encode(job_id));
        let response = self.transport.send(Method::Get, &path, None).await?;
        let mut snapshot: JobSnapshot = response.json()?;
        if snapshot.job_id.is_empty() {
            snapshot.job_id = job_id.to_string();
        }
        debug!(
            job_id = job_id,
            status = %snapshot.status,
            progress = snapshot.progress,
            "Job status"
        );
        Ok(snapshot)
    }

    /// Resolve a download URL that may be relative to the service base URL.
    pub fn resolve_url(&self, url: &str) -> Result<String, TransportError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute.to_string());
        }
        let base = format!("{}/", self.transport.base_url());
        Url::parse(&base)
            .and_then(|b| b.join(url.trim_start_matches('/')))
            .map(|u| u.to_string())
            .map_err(|e| TransportError::decode(url, format!("invalid download URL: {}", e)))
    }
}
