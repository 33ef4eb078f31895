use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::types::{DownloadProgress, FetchError};

/// Receives the running byte count after each chunk.
pub trait DownloadObserver: Send + Sync {
    fn on_download_progress(&self, progress: &DownloadProgress);
}

impl<F> DownloadObserver for F
where
    F: Fn(&DownloadProgress) + Send + Sync,
{
    fn on_download_progress(&self, progress: &DownloadProgress) {
        self(progress)
    }
}

#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Download `url` into `destination`, returning the number of bytes written.
    ///
    /// On failure nothing is left at `destination` and the partial file is
    /// removed.
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        observer: &dyn DownloadObserver,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError>;
}
