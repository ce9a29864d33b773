//! Queue Dispatcher
//!
//! Submits built tasks to a queue. Two interchangeable backends sit behind
//! [`QueueDispatcher`]:
//!
//! - [`ManagedQueueDispatcher`]: creates the task on the managed Cloud Tasks
//!   queue; the queue performs delivery.
//! - [`LocalQueueDispatcher`]: posts the whole task-creation request to the
//!   local queue emulator, which relays it to the handler synchronously.
//!
//! The backend is chosen once from configuration ([`from_config`]) and shared
//! as a [`SharedDispatcher`]. Neither backend retries.

pub mod local;
pub mod managed;
pub mod token;

use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt;
use std::sync::Arc;
use taskfan_common::task::{CreateTaskRequest, HttpMethod, QueuePath};
use taskfan_common::WireError;
use thiserror::Error;

use crate::config::Config;

pub use local::LocalQueueDispatcher;
pub use managed::{CloudTasksApi, CloudTasksClient, ManagedQueueDispatcher, ManagedQueueError};
pub use token::{MetadataServerToken, StaticToken, TokenSource};

/// Which queue backend the process submits to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Managed,
    Local,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Managed => write!(f, "managed"),
            BackendMode::Local => write!(f, "local"),
        }
    }
}

/// The unit submitted to a queue: one HTTP callback carrying one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub method: HttpMethod,
    pub target_url: String,
    pub body: Vec<u8>,
}

impl TaskDescriptor {
    /// Wrap the descriptor in a task-creation request, addressed to `queue`
    /// when one is given.
    pub fn to_request(&self, queue: Option<&QueuePath>) -> CreateTaskRequest {
        CreateTaskRequest::http(queue, self.method, self.target_url.clone(), self.body.clone())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to build task request: {0}")]
    Encode(#[from] WireError),

    #[error("failed to send task to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("task schedule failed: {status}{}", format_body(.body))]
    Rejected { status: StatusCode, body: String },

    #[error("failed to queue task: {0}")]
    Managed(#[from] ManagedQueueError),
}

fn format_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(" ({})", body)
    }
}

#[async_trait]
pub trait QueueDispatcher: Send + Sync {
    fn mode(&self) -> BackendMode;

    /// Submit one task. Returns once the backend has accepted or refused it.
    async fn submit(&self, task: &TaskDescriptor) -> Result<(), DispatchError>;
}

pub type SharedDispatcher = Arc<dyn QueueDispatcher>;

/// Build the dispatcher selected by configuration
pub fn from_config(config: &Config) -> anyhow::Result<SharedDispatcher> {
    match config.backend_mode() {
        BackendMode::Managed => {
            let gcp = config
                .gcp
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("managed mode requires GCP_PROJECT"))?;
            let tokens: Arc<dyn TokenSource> = match &gcp.access_token {
                Some(token) => Arc::new(StaticToken::new(token.clone())),
                None => Arc::new(MetadataServerToken::new(gcp.metadata_token_url.clone())?),
            };
            let client = CloudTasksClient::new(gcp.tasks_endpoint.clone(), tokens)?;
            Ok(Arc::new(ManagedQueueDispatcher::new(
                Arc::new(client),
                gcp.queue_path(),
            )))
        },
        BackendMode::Local => Ok(Arc::new(LocalQueueDispatcher::new(
            config.queue.queue_url.clone(),
            config.queue.dispatch_timeout(),
        )?)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_follows_backend_mode() {
        let local = from_config(&Config::default()).unwrap();
        assert_eq!(local.mode(), BackendMode::Local);

        let config = Config::from_lookup(|key| match key {
            "GCP_PROJECT" => Some("demo".to_string()),
            "GCP_ACCESS_TOKEN" => Some("token".to_string()),
            _ => None,
        })
        .unwrap();
        let managed = from_config(&config).unwrap();
        assert_eq!(managed.mode(), BackendMode::Managed);
    }

    #[test]
    fn test_descriptor_to_request() {
        let task = TaskDescriptor {
            method: HttpMethod::Post,
            target_url: "http://handler".to_string(),
            body: b"{}".to_vec(),
        };

        let local = task.to_request(None);
        assert!(local.parent.is_none());

        let queue = QueuePath::new("p", "r", "q");
        let managed = task.to_request(Some(&queue));
        assert_eq!(managed.parent.as_deref(), Some("projects/p/locations/r/queues/q"));
        assert_eq!(managed.http_request().unwrap().body, b"{}");
    }

    #[test]
    fn test_rejected_message_includes_body() {
        let err = DispatchError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "failed to send task".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "task schedule failed: 500 Internal Server Error (failed to send task)"
        );

        let err = DispatchError::Rejected {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "task schedule failed: 502 Bad Gateway");
    }
}
