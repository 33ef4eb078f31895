//! Full runs against an in-process fake job service.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

use vidgen_core::fetcher::partial_path;
use vidgen_core::testing::{fixtures, RecordingObserver};
use vidgen_core::transport::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use vidgen_core::{load_config_from_str, ErrorKind, JobStatus, Orchestrator, Signer};

const SECRET: &str = "e2e-secret";
const ARTIFACT_SIZE: usize = 256 * 1024 + 3;

/// How a submitted job behaves.
#[derive(Clone, Copy)]
enum Script {
    Succeeds,
    Fails,
    NeverFinishes,
}

struct FakeService {
    script: Script,
    submissions: AtomicUsize,
    polls: Mutex<HashMap<String, usize>>,
}

async fn health() -> Json<Value> {
    Json(fixtures::health_body())
}

async fn generate(
    State(service): State<Arc<FakeService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok());
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let body = String::from_utf8_lossy(&body).to_string();

    let valid = match (timestamp, signature) {
        (Some(ts), Some(sig)) => Signer::new(SECRET).unwrap().verify(ts, &body, sig),
        _ => false,
    };
    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid signature"})),
        )
            .into_response();
    }

    let n = service.submissions.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::ACCEPTED,
        Json(json!({"jobId": format!("job-{}", n), "status": "pending"})),
    )
        .into_response()
}

async fn job(State(service): State<Arc<FakeService>>, Path(id): Path<String>) -> Response {
    let poll = {
        let mut polls = service.polls.lock().unwrap();
        let count = polls.entry(id.clone()).or_insert(0);
        *count += 1;
        *count
    };

    let body = match (service.script, poll) {
        (_, 1) => json!({"jobId": id, "status": "pending", "progress": 0}),
        (Script::NeverFinishes, _) => {
            json!({"jobId": id, "status": "processing", "progress": 10, "currentStep": "rendering"})
        }
        (_, 2) => {
            json!({"jobId": id, "status": "processing", "progress": 50, "currentStep": "rendering"})
        }
        (Script::Fails, _) => {
            json!({"jobId": id, "status": "failed", "progress": 50, "error": "Chromium crashed"})
        }
        (Script::Succeeds, _) => json!({
            "jobId": id,
            "status": "completed",
            "progress": 100,
            "downloadUrl": format!("/download/{}.mp4", id),
            "fileSize": ARTIFACT_SIZE,
            "duration": 8.0,
            "resolution": "1080x1920",
            "expiresAt": "2099-01-01T00:00:00Z"
        }),
    };
    Json(body).into_response()
}

async fn download(Path(_file): Path<String>) -> Response {
    (
        [(header::CONTENT_TYPE, "video/mp4")],
        common::artifact_bytes(ARTIFACT_SIZE),
    )
        .into_response()
}

async fn fake_service(script: Script) -> String {
    let service = Arc::new(FakeService {
        script,
        submissions: AtomicUsize::new(0),
        polls: Mutex::new(HashMap::new()),
    });
    let router = Router::new()
        .route("/health", get(health))
        .route("/generate-video", post(generate))
        .route("/job/{id}", get(job))
        .route("/download/{file}", get(download))
        .with_state(service);
    common::serve(router).await
}

fn orchestrator(base_url: &str, secret: &str, output: &TempDir, deadline_secs: u64) -> Orchestrator {
    let config = load_config_from_str(&format!(
        r#"
[service]
base_url = "{}"
secret = "{}"

[poll]
interval_ms = 20
deadline_secs = {}

[output]
dir = "{}"
"#,
        base_url,
        secret,
        deadline_secs,
        output.path().display()
    ))
    .unwrap();
    Orchestrator::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_generate_and_download() {
    let base_url = fake_service(Script::Succeeds).await;
    let output = TempDir::new().unwrap();
    let observer = RecordingObserver::new();

    let result = orchestrator(&base_url, SECRET, &output, 30)
        .run(
            &fixtures::generate_request(),
            None,
            &observer,
            &CancellationToken::new(),
        )
        .await;
    let report = assert_ok!(result);

    assert_eq!(report.job_id, "job-0");
    assert_eq!(report.artifact_path, output.path().join("job-0.mp4"));
    assert_eq!(report.artifact_bytes, ARTIFACT_SIZE as u64);
    assert_eq!(report.duration, Some(8.0));
    assert_eq!(report.resolution.as_deref(), Some("1080x1920"));
    assert!(report.expires_at.is_some());

    assert_eq!(
        std::fs::read(&report.artifact_path).unwrap(),
        common::artifact_bytes(ARTIFACT_SIZE)
    );
    assert!(!partial_path(&report.artifact_path).exists());

    let statuses: Vec<_> = observer
        .observations()
        .iter()
        .map(|o| (o.status, o.progress))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (JobStatus::Pending, 0),
            (JobStatus::Processing, 50),
            (JobStatus::Completed, 100),
        ]
    );
    assert_eq!(
        observer.downloads().last().map(|p| p.received_bytes),
        Some(ARTIFACT_SIZE as u64)
    );
}

#[tokio::test]
async fn test_explicit_destination() {
    let base_url = fake_service(Script::Succeeds).await;
    let output = TempDir::new().unwrap();

    let report = orchestrator(&base_url, SECRET, &output, 30)
        .run(
            &fixtures::generate_request(),
            Some(std::path::Path::new("clips/first.mp4")),
            &RecordingObserver::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.artifact_path, output.path().join("clips/first.mp4"));
    assert!(report.artifact_path.exists());
}

#[tokio::test]
async fn test_failed_job_reports_reason() {
    let base_url = fake_service(Script::Fails).await;
    let output = TempDir::new().unwrap();

    let err = orchestrator(&base_url, SECRET, &output, 30)
        .run(
            &fixtures::generate_request(),
            None,
            &RecordingObserver::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::JobFailed);
    assert_eq!(err.job_failure_reason(), Some("Chromium crashed"));
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_wrong_secret_fails_submission() {
    let base_url = fake_service(Script::Succeeds).await;
    let output = TempDir::new().unwrap();

    let err = orchestrator(&base_url, "wrong-secret", &output, 30)
        .run(
            &fixtures::generate_request(),
            None,
            &RecordingObserver::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert!(err.to_string().contains("Invalid signature"), "{}", err);
}

#[tokio::test]
async fn test_job_that_never_finishes_times_out() {
    let base_url = fake_service(Script::NeverFinishes).await;
    let output = TempDir::new().unwrap();
    let observer = RecordingObserver::new();

    let err = orchestrator(&base_url, SECRET, &output, 1)
        .run(
            &fixtures::generate_request(),
            None,
            &observer,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    // Pending once, then the unchanging processing state once.
    assert_eq!(observer.observations().len(), 2);
}

#[tokio::test]
async fn test_unreachable_service() {
    let addr = common::unused_addr();
    let output = TempDir::new().unwrap();

    let err = orchestrator(&format!("http://{}", addr), SECRET, &output, 30)
        .run(
            &fixtures::generate_request(),
            None,
            &RecordingObserver::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
}
