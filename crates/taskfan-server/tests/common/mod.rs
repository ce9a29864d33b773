//! Shared helpers for taskfan-server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taskfan_server::dispatch::{BackendMode, DispatchError, QueueDispatcher, TaskDescriptor};
use tempfile::NamedTempFile;
use tower::ServiceExt;

/// In-memory dispatcher that records submissions and can fail on the n-th one.
pub struct RecordingDispatcher {
    mode: BackendMode,
    fail_on: Option<usize>,
    delay: Option<Duration>,
    submitted: Mutex<Vec<TaskDescriptor>>,
}

impl RecordingDispatcher {
    pub fn new(mode: BackendMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            fail_on: None,
            delay: None,
            submitted: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_on(mode: BackendMode, n: usize) -> Arc<Self> {
        Arc::new(Self {
            mode,
            fail_on: Some(n),
            delay: None,
            submitted: Mutex::new(Vec::new()),
        })
    }

    /// Each submission takes `delay` before it is recorded.
    pub fn slow(mode: BackendMode, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            mode,
            fail_on: None,
            delay: Some(delay),
            submitted: Mutex::new(Vec::new()),
        })
    }

    pub fn submitted(&self) -> Vec<TaskDescriptor> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<BTreeMap<String, String>> {
        self.submitted()
            .iter()
            .map(|task| serde_json::from_slice(&task.body).unwrap())
            .collect()
    }
}

#[async_trait]
impl QueueDispatcher for RecordingDispatcher {
    fn mode(&self) -> BackendMode {
        self.mode
    }

    async fn submit(&self, task: &TaskDescriptor) -> Result<(), DispatchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut submitted = self.submitted.lock().unwrap();
        if self.fail_on == Some(submitted.len() + 1) {
            return Err(DispatchError::Rejected {
                status: StatusCode::BAD_GATEWAY,
                body: "queue unavailable".to_string(),
            });
        }
        submitted.push(task.clone());
        Ok(())
    }
}

pub fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Send a GET through the router and return status plus body.
pub async fn get(app: Router, uri: &str) -> (axum::http::StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };

    (status, json)
}

/// Run `app` on an ephemeral local port and return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Percent-encode a path for use in a query string.
pub fn query_path(path: &std::path::Path) -> String {
    url::form_urlencoded::byte_serialize(path.to_string_lossy().as_bytes()).collect()
}
