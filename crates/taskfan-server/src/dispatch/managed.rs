//! Managed backend: creates tasks on a Cloud Tasks queue

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use taskfan_common::task::{CreateTaskRequest, QueuePath, Task};
use thiserror::Error;
use tracing::{debug, instrument};

use super::{BackendMode, DispatchError, QueueDispatcher, TaskDescriptor, TokenSource};

#[derive(Debug, Error)]
pub enum ManagedQueueError {
    #[error("failed to obtain access token: {0}")]
    Auth(#[source] reqwest::Error),

    #[error("task request has no parent queue")]
    MissingParent,

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("queue service returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// Task-creation operation of the managed queue service
#[async_trait]
pub trait CloudTasksApi: Send + Sync {
    /// Create a task on `request.parent` and return it as stored by the queue.
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ManagedQueueError>;
}

#[derive(Serialize)]
struct CreateTaskBody<'a> {
    task: &'a Task,
}

/// Cloud Tasks v2 REST client.
///
/// One instance is built at startup and shared by every ingestion request.
/// No request timeout is set; only connecting is bounded.
pub struct CloudTasksClient {
    http: Client,
    endpoint: String,
    tokens: Arc<dyn TokenSource>,
}

impl CloudTasksClient {
    pub fn new(
        endpoint: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }
}

#[async_trait]
impl CloudTasksApi for CloudTasksClient {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ManagedQueueError> {
        let parent = request
            .parent
            .as_deref()
            .ok_or(ManagedQueueError::MissingParent)?;
        let url = format!("{}/v2/{}/tasks", self.endpoint, parent);
        let token = self.tokens.token().await?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&CreateTaskBody { task: &request.task })
            .send()
            .await
            .map_err(|source| ManagedQueueError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ManagedQueueError::Api { status, message });
        }

        response
            .json()
            .await
            .map_err(|source| ManagedQueueError::Transport { url, source })
    }
}

/// Dispatches to a managed queue, addressing every task to the fully
/// resolved queue path.
pub struct ManagedQueueDispatcher {
    client: Arc<dyn CloudTasksApi>,
    queue: QueuePath,
}

impl ManagedQueueDispatcher {
    pub fn new(client: Arc<dyn CloudTasksApi>, queue: QueuePath) -> Self {
        Self { client, queue }
    }
}

#[async_trait]
impl QueueDispatcher for ManagedQueueDispatcher {
    fn mode(&self) -> BackendMode {
        BackendMode::Managed
    }

    #[instrument(skip_all, fields(queue = %self.queue))]
    async fn submit(&self, task: &TaskDescriptor) -> Result<(), DispatchError> {
        let request = task.to_request(Some(&self.queue));
        let created = self.client.create_task(&request).await?;
        debug!(task = created.name.as_deref().unwrap_or("<unnamed>"), "Task queued");
        Ok(())
    }
}
