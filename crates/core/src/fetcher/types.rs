//! Types for artifact downloads.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::transport::NetworkCause;

/// Suffix of the in-progress file next to the destination.
pub const PARTIAL_SUFFIX: &str = "part";

/// Errors that can occur while downloading an artifact.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response, a dropped connection, or an inactivity timeout.
    #[error("network error ({cause}) downloading {url}: {message}")]
    Network {
        url: String,
        cause: NetworkCause,
        message: String,
    },

    /// The artifact endpoint answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    /// The stream ended before `Content-Length` bytes arrived.
    #[error("download of {url} incomplete: received {received} of {expected} bytes")]
    Incomplete {
        url: String,
        received: u64,
        expected: u64,
    },

    /// Local filesystem failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The download was cancelled by the caller.
    #[error("download of {url} cancelled")]
    Cancelled { url: String },

    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl FetchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn network(url: impl Into<String>, cause: NetworkCause, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            cause,
            message: message.into(),
        }
    }
}

/// Byte count reported after each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub received_bytes: u64,
    /// From `Content-Length`, when the server sent one.
    pub expected_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Completion percentage, only when the total size is known.
    pub fn percent(&self) -> Option<f64> {
        match self.expected_bytes {
            Some(0) => Some(100.0),
            Some(total) => Some((self.received_bytes as f64 / total as f64 * 100.0).min(100.0)),
            None => None,
        }
    }
}

/// Client-local state of one download.
#[derive(Debug)]
pub struct DownloadSession {
    pub source_url: String,
    pub destination: PathBuf,
    pub expected_size: Option<u64>,
    pub received_bytes: u64,
}

impl DownloadSession {
    pub fn new(source_url: impl Into<String>, destination: impl Into<PathBuf>, expected_size: Option<u64>) -> Self {
        Self {
            source_url: source_url.into(),
            destination: destination.into(),
            expected_size,
            received_bytes: 0,
        }
    }

    /// Account for a written chunk.
    pub fn record(&mut self, len: usize) -> DownloadProgress {
        self.received_bytes += len as u64;
        self.progress()
    }

    pub fn progress(&self) -> DownloadProgress {
        DownloadProgress {
            received_bytes: self.received_bytes,
            expected_bytes: self.expected_size,
        }
    }

    /// Fails if a size hint was given and the byte count does not match it.
    pub fn check_complete(&self) -> Result<(), FetchError> {
        match self.expected_size {
            Some(expected) if expected != self.received_bytes => Err(FetchError::Incomplete {
                url: self.source_url.clone(),
                received: self.received_bytes,
                expected,
            }),
            _ => Ok(()),
        }
    }
}

/// Path of the in-progress file for `destination` (`video.mp4` -> `video.mp4.part`).
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name: OsString = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

/// Fetcher settings.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Maximum silence between two chunks (and before the response headers).
    pub inactivity_timeout: Duration,
    /// TCP connect bound.
    pub connect_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&TimeoutConfig> for FetcherConfig {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            inactivity_timeout: config.download_inactivity(),
            connect_timeout: config.connect_timeout(),
        }
    }
}
