//! Task Builder: record to task descriptor

use taskfan_common::task::HttpMethod;
use thiserror::Error;
use tracing::debug;

use super::mapper::Record;
use crate::dispatch::TaskDescriptor;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to encode row: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Turns records into POST tasks aimed at one fixed handler URL.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    target_url: String,
}

impl TaskBuilder {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
        }
    }

    /// The body is the record as a JSON object.
    pub fn build(&self, record: &Record) -> Result<TaskDescriptor, BuildError> {
        let body = serde_json::to_vec(record)?;
        debug!(payload = %String::from_utf8_lossy(&body), "Built task payload");

        Ok(TaskDescriptor {
            method: HttpMethod::Post,
            target_url: self.target_url.clone(),
            body,
        })
    }
}
