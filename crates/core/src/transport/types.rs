//! Types for transport operations.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::signer::SignerError;

/// Header carrying the request timestamp (integer seconds).
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";

/// Header carrying the lowercase hex HMAC of the request.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Why a request got no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkCause {
    /// The per-call timeout elapsed.
    Timeout,
    /// Connection refused, DNS failure, TLS failure.
    Connect,
    /// Anything else (body read interrupted, redirect loop, ...).
    Other,
}

impl NetworkCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkCause::Timeout => "timeout",
            NetworkCause::Connect => "connect",
            NetworkCause::Other => "other",
        }
    }
}

impl fmt::Display for NetworkCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while talking to the job service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response was received.
    #[error("network error ({cause}) calling {endpoint}: {message}")]
    Network {
        endpoint: String,
        cause: NetworkCause,
        message: String,
    },

    /// A response was received with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Server {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// A successful response could not be decoded.
    #[error("invalid response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The request body could not be serialized.
    #[error("could not encode request for {endpoint}: {message}")]
    Encode { endpoint: String, message: String },

    /// The request body could not be signed.
    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),

    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl TransportError {
    pub fn network(endpoint: impl Into<String>, cause: NetworkCause, message: impl Into<String>) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            cause,
            message: message.into(),
        }
    }

    pub fn server(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    pub fn encode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Whether this is a `Network` error caused by the per-call timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Network {
                cause: NetworkCause::Timeout,
                ..
            }
        )
    }

    /// HTTP status for `Server` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// HTTP methods used against the job service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Full URL that produced the response.
    pub endpoint: String,
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body (`Null` for an empty body).
    pub body: Value,
}

impl TransportResponse {
    /// Deserialize the body into `T`.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T, TransportError> {
        let endpoint = self.endpoint;
        serde_json::from_value(self.body).map_err(|e| TransportError::decode(endpoint, e.to_string()))
    }
}

/// Transport settings, taken by value at construction.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Service base URL without trailing slash.
    pub base_url: String,
    /// Whole-request bound for control calls.
    pub request_timeout: Duration,
    /// TCP connect bound.
    pub connect_timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Derive transport settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Url::parse(&config.service.base_url).map_err(|e| {
            ConfigError::ValidationError(format!("invalid service.base_url: {}", e))
        })?;
        Ok(Self {
            request_timeout: config.timeouts.request_timeout(),
            connect_timeout: config.timeouts.connect_timeout(),
            ..Self::new(config.service.base_url.clone())
        })
    }
}
