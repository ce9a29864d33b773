//! Integration tests for the ingestion endpoint
//!
//! These tests verify:
//! - Every row of a local file becomes one task
//! - Client errors for a missing parameter, unreadable files and remote URIs
//! - Fail-fast behaviour when dispatch fails mid-file
//! - The row loop finishing after the client has gone away

use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use taskfan_server::{
    dispatch::BackendMode,
    ingest::{self, IngestState, Pipeline, TaskBuilder},
    storage::UnimplementedStore,
};
use tokio_util::sync::CancellationToken;

mod common;
use common::{csv_file, get, query_path, record, spawn, RecordingDispatcher};

const HANDLER_URL: &str = "http://localhost:8083";

fn app(dispatcher: Arc<RecordingDispatcher>) -> axum::Router {
    let pipeline = Pipeline::new(
        TaskBuilder::new(HANDLER_URL),
        dispatcher,
        CancellationToken::new(),
    );
    ingest::router(IngestState::new(pipeline, Arc::new(UnimplementedStore)))
}

#[tokio::test]
async fn test_local_file_dispatches_every_row() {
    let dispatcher = RecordingDispatcher::new(BackendMode::Local);
    let file = csv_file("id,name,email\n1,ada,ada@example.com\n2,grace\n3,linus,l@example.com,extra\n");

    let (status, body) = get(app(dispatcher.clone()), &format!("/?f={}", query_path(file.path()))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::Value::Null);
    assert_eq!(
        dispatcher.bodies(),
        vec![
            record(&[("id", "1"), ("name", "ada"), ("email", "ada@example.com")]),
            record(&[("id", "2"), ("name", "grace")]),
            record(&[("id", "3"), ("name", "linus"), ("email", "l@example.com")]),
        ]
    );
    assert!(dispatcher
        .submitted()
        .iter()
        .all(|task| task.target_url == HANDLER_URL));
}

#[tokio::test]
async fn test_missing_parameter_is_bad_request() {
    let dispatcher = RecordingDispatcher::new(BackendMode::Local);

    let (status, body) = get(app(dispatcher.clone()), "/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "parameter f (file) is mandatory");

    let (status, _) = get(app(dispatcher.clone()), "/?f=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(dispatcher.submitted().is_empty());
}

#[tokio::test]
async fn test_unopenable_file_is_bad_request() {
    let dispatcher = RecordingDispatcher::new(BackendMode::Local);

    let (status, body) = get(app(dispatcher.clone()), "/?f=/no/such/input.csv").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("/no/such/input.csv"));
    assert!(dispatcher.submitted().is_empty());
}

#[tokio::test]
async fn test_remote_uri_without_gcp_is_rejected() {
    let dispatcher = RecordingDispatcher::new(BackendMode::Local);

    let (status, body) = get(app(dispatcher.clone()), "/?f=gs://bucket/rows.csv").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "GCP is not configured");
    assert!(dispatcher.submitted().is_empty());
}

#[tokio::test]
async fn test_remote_uri_in_managed_mode_is_not_implemented() {
    let dispatcher = RecordingDispatcher::new(BackendMode::Managed);

    let (status, _) = get(app(dispatcher.clone()), "/?f=gs://bucket/rows.csv").await;

    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert!(dispatcher.submitted().is_empty());
}

#[tokio::test]
async fn test_empty_file_is_server_error() {
    let dispatcher = RecordingDispatcher::new(BackendMode::Local);
    let file = csv_file("");

    let (status, body) = get(app(dispatcher.clone()), &format!("/?f={}", query_path(file.path()))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "input file is empty");
    assert!(dispatcher.submitted().is_empty());
}

#[tokio::test]
async fn test_header_only_file_succeeds_without_tasks() {
    let dispatcher = RecordingDispatcher::new(BackendMode::Local);
    let file = csv_file("a,b\n");

    let (status, _) = get(app(dispatcher.clone()), &format!("/?f={}", query_path(file.path()))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(dispatcher.submitted().is_empty());
}

#[tokio::test]
async fn test_dispatch_failure_aborts_remaining_rows() {
    let dispatcher = RecordingDispatcher::failing_on(BackendMode::Local, 3);
    let file = csv_file("n\n1\n2\n3\n4\n5\n");

    let (status, body) = get(app(dispatcher.clone()), &format!("/?f={}", query_path(file.path()))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("failed to queue task on row 4"), "{message}");
    assert!(message.contains("queue unavailable"), "{message}");
    assert_eq!(dispatcher.bodies(), vec![record(&[("n", "1")]), record(&[("n", "2")])]);
}

#[tokio::test]
async fn test_repeated_parameter_uses_first_value() {
    let dispatcher = RecordingDispatcher::new(BackendMode::Local);
    let first = csv_file("k\nfirst\n");
    let second = csv_file("k\nsecond\n");

    let uri = format!(
        "/?f={}&f={}",
        query_path(first.path()),
        query_path(second.path())
    );
    let (status, _) = get(app(dispatcher.clone()), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(dispatcher.bodies(), vec![record(&[("k", "first")])]);
}

#[tokio::test]
async fn test_client_disconnect_does_not_stop_ingestion() {
    let dispatcher = RecordingDispatcher::slow(BackendMode::Local, Duration::from_millis(50));
    let rows: String = (1..=10).map(|n| format!("{n}\n")).collect();
    let file = csv_file(&format!("n\n{rows}"));
    let base = spawn(app(dispatcher.clone())).await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(120))
        .build()
        .unwrap();
    let result = client
        .get(format!("{}/?f={}", base, query_path(file.path())))
        .send()
        .await;
    assert!(result.is_err(), "request should time out before the file is done");
    assert!(dispatcher.submitted().len() < 10);

    for _ in 0..100 {
        if dispatcher.submitted().len() == 10 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let expected: Vec<_> = (1..=10)
        .map(|n| record(&[("n", n.to_string().as_str())]))
        .collect();
    assert_eq!(dispatcher.bodies(), expected);
}

#[tokio::test]
async fn test_health() {
    let dispatcher = RecordingDispatcher::new(BackendMode::Local);
    let response = tower::ServiceExt::oneshot(
        app(dispatcher),
        axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
