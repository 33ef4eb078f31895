use async_trait::async_trait;
use serde_json::Value;

use super::types::{Method, TransportError, TransportResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Base URL every request path is appended to (no trailing slash).
    fn base_url(&self) -> &str;

    /// Issue a request. A `body` is signed and sent as JSON.
    ///
    /// Non-2xx responses are returned as `TransportError::Server`.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<TransportResponse, TransportError>;
}
