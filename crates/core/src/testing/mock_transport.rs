//! Mock transport for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transport::{Method, Transport, TransportError, TransportResponse};

/// A recorded request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Mock implementation of the Transport trait.
///
/// Responses are queued per path:
/// - Errors are returned once, then removed
/// - Successful responses are consumed in order, and the last one repeats
/// - Paths with nothing queued answer 404
///
/// # Example
///
/// ```rust,ignore
/// use vidgen_core::testing::MockTransport;
///
/// let transport = MockTransport::new();
/// transport.push_response("/health", fixtures::health_body()).await;
///
/// let api = JobApi::new(Arc::new(transport));
/// ```
#[derive(Debug)]
pub struct MockTransport {
    base_url: String,
    /// Queued outcomes keyed by request path.
    responses: Arc<RwLock<HashMap<String, VecDeque<Result<Value, TransportError>>>>>,
    /// Every request seen, in order.
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_base_url("http://mock")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            responses: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue a successful JSON response for `path`.
    pub async fn push_response(&self, path: &str, body: Value) {
        self.push(path, Ok(body)).await;
    }

    /// Queue a one-shot error for `path`.
    pub async fn push_error(&self, path: &str, error: TransportError) {
        self.push(path, Err(error)).await;
    }

    /// Queue the status snapshots `GET /job/{job_id}` returns, in order.
    pub async fn script_job(&self, job_id: &str, snapshots: Vec<Value>) {
        let path = format!("/job/{}", urlencoding::encode(job_id));
        for snapshot in snapshots {
            self.push_response(&path, snapshot).await;
        }
    }

    /// Get all recorded requests.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Number of requests sent to `path`.
    pub async fn request_count(&self, path: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    async fn push(&self, path: &str, outcome: Result<Value, TransportError>) {
        self.responses
            .write()
            .await
            .entry(path.to_string())
            .or_default()
            .push_back(outcome);
    }

    async fn next_outcome(&self, path: &str) -> Option<Result<Value, TransportError>> {
        let mut responses = self.responses.write().await;
        let queue = responses.get_mut(path)?;
        if queue.len() == 1 && matches!(queue.front(), Some(Ok(_))) {
            return queue.front().and_then(|o| o.as_ref().ok().cloned()).map(Ok);
        }
        queue.pop_front()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<TransportResponse, TransportError> {
        self.requests.write().await.push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        let endpoint = format!("{}{}", self.base_url, path);
        match self.next_outcome(path).await {
            Some(Ok(body)) => Ok(TransportResponse {
                endpoint,
                status: 200,
                body,
            }),
            Some(Err(e)) => Err(e),
            None => Err(TransportError::server(endpoint, 404, "Not found")),
        }
    }
}
