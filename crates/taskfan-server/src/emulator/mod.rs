//! Queue Emulator Service
//!
//! Stands in for the delivery side of a managed queue. Each call decodes a
//! task-creation request and immediately performs the embedded HTTP request
//! against its target. There is no queueing and no retry: the caller learns
//! about a failed delivery from the emulator's own error response.
//!
//! Only transport failures count as failures. The downstream status and body
//! are logged and otherwise ignored.

pub mod routes;

use reqwest::{header::CONTENT_TYPE, Client, Method, StatusCode};
use std::time::Duration;
use taskfan_common::task::{CreateTaskRequest, HttpMethod};
use taskfan_common::WireError;
use thiserror::Error;
use tracing::{info, warn};

pub use routes::router;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to generate task from request: {0}")]
    Decode(#[from] WireError),

    #[error("task has no HTTP request to forward")]
    MissingHttpRequest,

    #[error("failed to send task to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Relays task requests to their targets.
///
/// Stateless apart from the pooled HTTP client, so one instance serves all
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Decode `data` and deliver the task it describes. Returns the
    /// downstream status for logging.
    pub async fn forward(&self, data: &[u8]) -> Result<StatusCode, ForwardError> {
        let request = CreateTaskRequest::from_json_slice(data)?;
        let http = request
            .task
            .http_request
            .ok_or(ForwardError::MissingHttpRequest)?;

        info!(method = %http.http_method, url = %http.url, "Forwarding task");

        let mut outbound = self.client.request(to_method(http.http_method), &http.url);

        let has_content_type = http
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        if !has_content_type {
            outbound = outbound.header(CONTENT_TYPE, "application/json");
        }
        for (name, value) in &http.headers {
            outbound = outbound.header(name.as_str(), value.as_str());
        }

        let response = outbound
            .body(http.body)
            .send()
            .await
            .map_err(|source| ForwardError::Transport {
                url: http.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %http.url, status = status.as_u16(), "Task handler returned an error status");
        }

        Ok(status)
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Post => Method::POST,
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Options => Method::OPTIONS,
    }
}
