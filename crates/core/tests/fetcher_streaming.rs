//! Streaming downloads against a local fake artifact server.

mod common;

use std::io;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use vidgen_core::fetcher::partial_path;
use vidgen_core::testing::RecordingObserver;
use vidgen_core::{ArtifactFetcher, FetchError, FetcherConfig, NetworkCause, StreamingFetcher};

const MIB: usize = 1024 * 1024;
const FULL_SIZE: usize = 10 * MIB;

fn chunks(data: Vec<u8>) -> Vec<Result<Bytes, io::Error>> {
    data.chunks(MIB)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}

async fn full() -> Response {
    let data = common::artifact_bytes(FULL_SIZE);
    Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, FULL_SIZE)
        .body(Body::from_stream(stream::iter(chunks(data))))
        .unwrap()
}

/// Promises 10 MiB, sends 4 MiB, then fails the body.
async fn interrupted() -> Response {
    let mut parts = chunks(common::artifact_bytes(4 * MIB));
    parts.push(Err(io::Error::new(io::ErrorKind::BrokenPipe, "worker died")));
    Response::builder()
        .header(header::CONTENT_LENGTH, FULL_SIZE)
        .body(Body::from_stream(stream::iter(parts)))
        .unwrap()
}

async fn no_length() -> Response {
    Response::builder()
        .body(Body::from_stream(stream::iter(chunks(
            common::artifact_bytes(3 * MIB + 17),
        ))))
        .unwrap()
}

/// Sends one chunk, then goes silent.
async fn stalled() -> Response {
    let first = stream::iter(chunks(common::artifact_bytes(MIB)));
    Response::builder()
        .header(header::CONTENT_LENGTH, FULL_SIZE)
        .body(Body::from_stream(first.chain(stream::pending())))
        .unwrap()
}

async fn gone() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Video not found")
}

async fn artifact_server() -> String {
    let router = Router::new()
        .route("/download/full.mp4", get(full))
        .route("/download/interrupted.mp4", get(interrupted))
        .route("/download/no_length.mp4", get(no_length))
        .route("/download/stalled.mp4", get(stalled))
        .route("/download/gone.mp4", get(gone));
    common::serve(router).await
}

fn fetcher() -> StreamingFetcher {
    StreamingFetcher::new(FetcherConfig::default()).unwrap()
}

#[tokio::test]
async fn test_full_download_reports_monotonic_progress() {
    let base_url = artifact_server().await;
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("video.mp4");
    let observer = RecordingObserver::new();

    let bytes = fetcher()
        .fetch(
            &format!("{}/download/full.mp4", base_url),
            &destination,
            &observer,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(bytes, FULL_SIZE as u64);
    assert_eq!(
        std::fs::metadata(&destination).unwrap().len(),
        FULL_SIZE as u64
    );
    assert_eq!(
        std::fs::read(&destination).unwrap(),
        common::artifact_bytes(FULL_SIZE)
    );
    assert!(!partial_path(&destination).exists());

    let progress = observer.downloads();
    assert!(!progress.is_empty());
    assert!(progress
        .windows(2)
        .all(|w| w[0].received_bytes <= w[1].received_bytes));
    let last = progress.last().unwrap();
    assert_eq!(last.received_bytes, FULL_SIZE as u64);
    assert_eq!(last.expected_bytes, Some(FULL_SIZE as u64));
    assert_eq!(last.percent(), Some(100.0));
}

#[tokio::test]
async fn test_interrupted_download_leaves_nothing_behind() {
    let base_url = artifact_server().await;
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("video.mp4");

    let err = fetcher()
        .fetch(
            &format!("{}/download/interrupted.mp4", base_url),
            &destination,
            &RecordingObserver::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            FetchError::Network { .. } | FetchError::Incomplete { .. }
        ),
        "{:?}",
        err
    );
    assert!(!destination.exists());
    assert!(!partial_path(&destination).exists());
}

#[tokio::test]
async fn test_download_without_content_length() {
    let base_url = artifact_server().await;
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("nested/out/video.mp4");
    let observer = RecordingObserver::new();

    let bytes = fetcher()
        .fetch(
            &format!("{}/download/no_length.mp4", base_url),
            &destination,
            &observer,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(bytes, (3 * MIB + 17) as u64);
    assert_eq!(std::fs::metadata(&destination).unwrap().len(), bytes);
    let last = *observer.downloads().last().unwrap();
    assert_eq!(last.expected_bytes, None);
    assert_eq!(last.percent(), None);
}

#[tokio::test]
async fn test_not_found_is_http_error() {
    let base_url = artifact_server().await;
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("video.mp4");

    let err = fetcher()
        .fetch(
            &format!("{}/download/gone.mp4", base_url),
            &destination,
            &RecordingObserver::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 404, .. }), "{:?}", err);
    assert!(!destination.exists());
    assert!(!partial_path(&destination).exists());
}

#[tokio::test]
async fn test_stalled_download_hits_inactivity_timeout() {
    let base_url = artifact_server().await;
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("video.mp4");
    let fetcher = StreamingFetcher::new(FetcherConfig {
        inactivity_timeout: Duration::from_millis(300),
        ..Default::default()
    })
    .unwrap();

    let err = fetcher
        .fetch(
            &format!("{}/download/stalled.mp4", base_url),
            &destination,
            &RecordingObserver::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        FetchError::Network { cause, .. } => assert_eq!(cause, NetworkCause::Timeout),
        other => panic!("expected inactivity timeout, got {:?}", other),
    }
    assert!(!destination.exists());
    assert!(!partial_path(&destination).exists());
}

#[tokio::test]
async fn test_cancelled_download_is_removed() {
    let base_url = artifact_server().await;
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("video.mp4");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let err = fetcher()
        .fetch(
            &format!("{}/download/stalled.mp4", base_url),
            &destination,
            &RecordingObserver::new(),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Cancelled { .. }), "{:?}", err);
    assert!(!partial_path(&destination).exists());
}

#[tokio::test]
async fn test_destination_under_a_file_is_io_error() {
    let base_url = artifact_server().await;
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let destination = blocker.join("video.mp4");

    let err = fetcher()
        .fetch(
            &format!("{}/download/full.mp4", base_url),
            &destination,
            &RecordingObserver::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Io { .. }), "{:?}", err);
    assert!(!partial_path(&destination).exists());
    assert_eq!(std::fs::read(&blocker).unwrap(), b"not a directory");
}
