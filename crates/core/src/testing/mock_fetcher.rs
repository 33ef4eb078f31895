//! Mock fetcher for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::fetcher::{ArtifactFetcher, DownloadObserver, DownloadProgress, FetchError};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub url: String,
    pub destination: PathBuf,
    pub success: bool,
}

/// Mock implementation of the ArtifactFetcher trait.
///
/// Nothing touches the filesystem; the configured byte count is reported in
/// two progress steps and returned.
#[derive(Debug)]
pub struct MockFetcher {
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<FetchError>>>,
    bytes: Arc<RwLock<u64>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            fetches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            bytes: Arc::new(RwLock::new(1024)),
        }
    }

    /// Size of the simulated artifact.
    pub async fn set_bytes(&self, bytes: u64) {
        *self.bytes.write().await = bytes;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded fetches.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }
}

#[async_trait]
impl ArtifactFetcher for MockFetcher {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        observer: &dyn DownloadObserver,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError> {
        let mut error = self.next_error.write().await.take();
        if error.is_none() && cancel.is_cancelled() {
            error = Some(FetchError::Cancelled {
                url: url.to_string(),
            });
        }

        self.fetches.write().await.push(RecordedFetch {
            url: url.to_string(),
            destination: destination.to_path_buf(),
            success: error.is_none(),
        });
        if let Some(e) = error {
            return Err(e);
        }

        let total = *self.bytes.read().await;
        for received_bytes in [total / 2, total] {
            observer.on_download_progress(&DownloadProgress {
                received_bytes,
                expected_bytes: Some(total),
            });
        }
        Ok(total)
    }
}
