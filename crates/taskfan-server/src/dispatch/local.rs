//! Local backend: hands tasks to the queue emulator over HTTP

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;
use tracing::{debug, instrument};

use super::{BackendMode, DispatchError, QueueDispatcher, TaskDescriptor};

/// Posts the full task-creation request to the local queue emulator.
///
/// Every call is bounded by the client timeout so a dead emulator cannot stall
/// an ingestion run. Any status of 300 or above is a failure.
#[derive(Debug, Clone)]
pub struct LocalQueueDispatcher {
    client: Client,
    queue_url: String,
}

impl LocalQueueDispatcher {
    pub fn new(queue_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            queue_url: queue_url.into(),
        })
    }
}

#[async_trait]
impl QueueDispatcher for LocalQueueDispatcher {
    fn mode(&self) -> BackendMode {
        BackendMode::Local
    }

    #[instrument(skip_all, fields(queue_url = %self.queue_url))]
    async fn submit(&self, task: &TaskDescriptor) -> Result<(), DispatchError> {
        let data = task.to_request(None).to_json_bytes()?;
        debug!(bytes = data.len(), "Sending task to local queue");

        let response = self
            .client
            .post(&self.queue_url)
            .header(CONTENT_TYPE, "application/json")
            .body(data)
            .send()
            .await
            .map_err(|source| DispatchError::Transport {
                url: self.queue_url.clone(),
                source,
            })?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected { status, body });
        }

        Ok(())
    }
}
