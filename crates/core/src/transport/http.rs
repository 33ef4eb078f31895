//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::signer::{canonical_body, current_unix_seconds, Signer};

use super::{
    Method, NetworkCause, Transport, TransportConfig, TransportError, TransportResponse,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};

/// Transport that signs bodies with a shared-secret HMAC.
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
    signer: Signer,
}

impl HttpTransport {
    /// Create a new transport. Fails only if the HTTP client cannot be built.
    pub fn new(config: TransportConfig, signer: Signer) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            signer,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

/// Why a reqwest call produced no response.
pub(crate) fn network_cause(e: &reqwest::Error) -> NetworkCause {
    if e.is_timeout() {
        NetworkCause::Timeout
    } else if e.is_connect() {
        NetworkCause::Connect
    } else {
        NetworkCause::Other
    }
}

fn classify_reqwest_error(endpoint: &str, e: &reqwest::Error) -> TransportError {
    TransportError::network(endpoint, network_cause(e), e.to_string())
}

/// Pull a human readable message out of an error response body.
///
/// Looks for `error` then `message` string fields; falls back to the
/// status reason phrase.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(Value::String(msg)) = map.get(key) {
                if !msg.is_empty() {
                    return msg.clone();
                }
            }
        }
    }
    match status.canonical_reason() {
        Some(reason) => format!("request failed ({})", reason),
        None => "request failed".to_string(),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .header(ACCEPT, "application/json");

        if let Some(body) = body {
            // Send exactly the bytes that were signed.
            let canonical = canonical_body(body);
            let timestamp = current_unix_seconds();
            let signature = self.signer.sign_canonical(timestamp, &canonical)?;
            request = request
                .header(CONTENT_TYPE, "application/json")
                .header(TIMESTAMP_HEADER, timestamp.to_string())
                .header(SIGNATURE_HEADER, signature)
                .body(canonical);
        }

        debug!(method = %method, endpoint = %url, signed = body.is_some(), "Sending request");

        let response = request
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&url, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&url, &e))?;

        if !status.is_success() {
            let message = extract_error_message(status, &text);
            warn!(endpoint = %url, status = status.as_u16(), error = %message, "Request rejected");
            return Err(TransportError::server(url, status.as_u16(), message));
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                TransportError::decode(
                    &url,
                    format!(
                        "{}: {}",
                        e,
                        text.chars().take(200).collect::<String>()
                    ),
                )
            })?
        };

        Ok(TransportResponse {
            endpoint: url,
            status: status.as_u16(),
            body,
        })
    }
}
