//! Task wire model
//!
//! A task-creation request in the managed queue's JSON shape:
//!
//! ```json
//! {
//!   "parent": "projects/p/locations/r/queues/q",
//!   "task": {
//!     "httpRequest": {
//!       "httpMethod": "POST",
//!       "url": "http://handler",
//!       "body": "eyJhIjoiMSJ9"
//!     }
//!   }
//! }
//! ```
//!
//! The body is base64 encoded. `parent` is omitted when the request targets
//! the local emulator.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// HTTP verb carried by a task.
///
/// An unspecified method decodes as POST, matching managed queue behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    #[serde(alias = "HTTP_METHOD_UNSPECIFIED")]
    Post,
    Get,
    Head,
    Put,
    Delete,
    Patch,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved managed queue identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePath {
    pub project: String,
    pub location: String,
    pub queue: String,
}

impl QueuePath {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            queue: queue.into(),
        }
    }
}

impl fmt::Display for QueuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/queues/{}",
            self.project, self.location, self.queue
        )
    }
}

/// The HTTP request a task delivers when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    #[serde(default)]
    pub http_method: HttpMethod,
    pub url: String,
    #[serde(default, with = "base64_body", skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<u8>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

/// A single unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned task name, absent on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_request: Option<HttpRequest>,
}

/// Request to create a task on a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub task: Task,
}

impl CreateTaskRequest {
    /// Build a request for an HTTP-target task.
    pub fn http(
        parent: Option<&QueuePath>,
        method: HttpMethod,
        url: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            parent: parent.map(ToString::to_string),
            task: Task {
                name: None,
                http_request: Some(HttpRequest {
                    http_method: method,
                    url: url.into(),
                    body,
                    headers: HashMap::new(),
                }),
            },
        }
    }

    pub fn http_request(&self) -> Option<&HttpRequest> {
        self.task.http_request.as_ref()
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

mod base64_body {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::WireError;
    use serde_json::json;

    #[test]
    fn test_queue_path_display() {
        let path = QueuePath::new("demo", "europe-west1", "csv-queue");
        assert_eq!(
            path.to_string(),
            "projects/demo/locations/europe-west1/queues/csv-queue"
        );
    }

    #[test]
    fn test_request_json_shape() {
        let queue = QueuePath::new("p", "r", "q");
        let request = CreateTaskRequest::http(
            Some(&queue),
            HttpMethod::Post,
            "http://localhost:8083",
            br#"{"a":"1"}"#.to_vec(),
        );

        let value: serde_json::Value =
            serde_json::from_slice(&request.to_json_bytes().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "parent": "projects/p/locations/r/queues/q",
                "task": {
                    "httpRequest": {
                        "httpMethod": "POST",
                        "url": "http://localhost:8083",
                        "body": "eyJhIjoiMSJ9"
                    }
                }
            })
        );
    }

    #[test]
    fn test_local_request_omits_parent() {
        let request =
            CreateTaskRequest::http(None, HttpMethod::Post, "http://h", b"x".to_vec());
        let value: serde_json::Value =
            serde_json::from_slice(&request.to_json_bytes().unwrap()).unwrap();
        assert!(value.get("parent").is_none());
    }

    #[test]
    fn test_decode_defaults_unspecified_method_to_post() {
        let request = CreateTaskRequest::from_json_slice(
            br#"{"task":{"httpRequest":{"httpMethod":"HTTP_METHOD_UNSPECIFIED","url":"http://h"}}}"#,
        )
        .unwrap();
        let http = request.http_request().unwrap();
        assert_eq!(http.http_method, HttpMethod::Post);
        assert!(http.body.is_empty());

        let request =
            CreateTaskRequest::from_json_slice(br#"{"task":{"httpRequest":{"url":"http://h"}}}"#)
                .unwrap();
        assert_eq!(request.http_request().unwrap().http_method, HttpMethod::Post);
    }

    #[test]
    fn test_decode_rejects_bad_base64_body() {
        let result = CreateTaskRequest::from_json_slice(
            br#"{"task":{"httpRequest":{"url":"http://h","body":"%%%"}}}"#,
        );
        assert!(matches!(result, Err(WireError::Serialization(_))));
    }

    #[test]
    fn test_decode_task_without_http_request() {
        let request = CreateTaskRequest::from_json_slice(br#"{"task":{}}"#).unwrap();
        assert!(request.http_request().is_none());
    }
}
