//! reqwest-backed streaming fetcher.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::transport::{network_cause, NetworkCause};

use super::{
    partial_path, ArtifactFetcher, DownloadObserver, DownloadSession, FetchError, FetcherConfig,
};

/// Downloads artifacts without buffering them in memory.
pub struct StreamingFetcher {
    client: Client,
    config: FetcherConfig,
}

impl StreamingFetcher {
    /// Create a new fetcher. There is no whole-download timeout, only the
    /// inactivity bound between chunks.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn open(&self, url: &str, cancel: &CancellationToken) -> Result<Response, FetchError> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled { url: url.to_string() }),
            result = tokio::time::timeout(self.config.inactivity_timeout, self.client.get(url).send()) => {
                match result {
                    Ok(Ok(response)) => response,
                    Ok(Err(e)) => return Err(classify(url, &e)),
                    Err(_) => return Err(self.inactivity_error(url)),
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Copy the body into `part`, then fsync. Does not clean up on error.
    async fn stream_to(
        &self,
        response: Response,
        part: &Path,
        session: &mut DownloadSession,
        observer: &dyn DownloadObserver,
        cancel: &CancellationToken,
    ) -> Result<(), FetchError> {
        let url = session.source_url.clone();
        let mut file = File::create(part)
            .await
            .map_err(|e| FetchError::io(part, e))?;
        let mut stream = Box::pin(response.bytes_stream());

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled { url: url.clone() }),
                next = tokio::time::timeout(self.config.inactivity_timeout, stream.next()) => next,
            };

            let chunk = match next {
                Err(_) => return Err(self.inactivity_error(&url)),
                Ok(None) => break,
                Ok(Some(Err(e))) => return Err(classify(&url, &e)),
                Ok(Some(Ok(chunk))) => chunk,
            };

            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(part, e))?;
            let progress = session.record(chunk.len());
            observer.on_download_progress(&progress);
        }

        file.flush().await.map_err(|e| FetchError::io(part, e))?;
        file.sync_all().await.map_err(|e| FetchError::io(part, e))?;
        drop(file);

        session.check_complete()
    }

    fn inactivity_error(&self, url: &str) -> FetchError {
        FetchError::network(
            url,
            NetworkCause::Timeout,
            format!(
                "no data for {}s",
                self.config.inactivity_timeout.as_secs()
            ),
        )
    }
}

fn classify(url: &str, e: &reqwest::Error) -> FetchError {
    FetchError::network(url, network_cause(e), e.to_string())
}

async fn remove_partial(part: &Path) {
    match tokio::fs::remove_file(part).await {
        Ok(()) => debug!(path = %part.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %part.display(), error = %e, "Failed to remove partial download"),
    }
}

#[async_trait]
impl ArtifactFetcher for StreamingFetcher {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        observer: &dyn DownloadObserver,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
        }

        let response = self.open(url, cancel).await?;
        let expected = response.content_length();
        debug!(url = url, expected_bytes = ?expected, "Download started");

        let part = partial_path(destination);
        let mut session = DownloadSession::new(url, destination, expected);

        if let Err(e) = self
            .stream_to(response, &part, &mut session, observer, cancel)
            .await
        {
            warn!(
                url = url,
                received_bytes = session.received_bytes,
                error = %e,
                "Download failed"
            );
            remove_partial(&part).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&part, destination).await {
            remove_partial(&part).await;
            return Err(FetchError::io(destination, e));
        }

        info!(
            url = url,
            path = %destination.display(),
            bytes = session.received_bytes,
            "Download complete"
        );
        Ok(session.received_bytes)
    }
}
