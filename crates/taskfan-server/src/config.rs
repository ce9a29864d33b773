//! Configuration management
//!
//! All three services read the same environment. Only the file handler cares
//! about the queue and GCP sections; the emulator and the echo handler just
//! bind to `HOST`/`PORT`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use taskfan_common::task::QueuePath;

use crate::dispatch::BackendMode;

// ============================================================================
// Defaults
// ============================================================================

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default local queue emulator address.
pub const DEFAULT_QUEUE_URL: &str = "http://localhost:8082";

/// Default downstream task handler address.
pub const DEFAULT_HANDLER_URL: &str = "http://localhost:8083";

/// Default GCP region hosting the task queue.
pub const DEFAULT_GCP_REGION: &str = "europe-west1";

/// Default task queue name.
pub const DEFAULT_GCP_TASK_QUEUE: &str = "csv-queue";

/// Default Cloud Tasks REST endpoint.
pub const DEFAULT_CLOUD_TASKS_ENDPOINT: &str = "https://cloudtasks.googleapis.com";

/// Default metadata server token endpoint used for managed queue credentials.
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Timeout for local dispatch and emulator forwarding, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 3;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub queue: QueueConfig,
    /// Present only when `GCP_PROJECT` is set
    pub gcp: Option<GcpConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Local queue emulator, used when no GCP project is configured
    pub queue_url: String,
    /// Downstream handler every task is addressed to
    pub handler_url: String,
    pub dispatch_timeout_secs: u64,
    pub forward_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    pub project: String,
    pub region: String,
    pub task_queue: String,
    pub tasks_endpoint: String,
    pub metadata_token_url: String,
    /// Pre-issued OAuth token; skips the metadata server when set
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl QueueConfig {
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }
}

impl GcpConfig {
    pub fn queue_path(&self) -> QueuePath {
        QueuePath::new(&self.project, &self.region, &self.task_queue)
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let parsed = |key: &str, default: u64| -> anyhow::Result<u64> {
            match var(key) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{} must be a whole number, got '{}'", key, value)),
                None => Ok(default),
            }
        };

        let port = parsed("PORT", u64::from(DEFAULT_PORT))?;
        let port = u16::try_from(port).map_err(|_| anyhow::anyhow!("PORT {} is out of range", port))?;

        let gcp = var("GCP_PROJECT").map(|project| GcpConfig {
            project,
            region: var("GCP_REGION").unwrap_or_else(|| DEFAULT_GCP_REGION.to_string()),
            task_queue: var("GCP_TASK_QUEUE").unwrap_or_else(|| DEFAULT_GCP_TASK_QUEUE.to_string()),
            tasks_endpoint: var("CLOUD_TASKS_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_CLOUD_TASKS_ENDPOINT.to_string()),
            metadata_token_url: var("GCP_METADATA_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_METADATA_TOKEN_URL.to_string()),
            access_token: var("GCP_ACCESS_TOKEN"),
        });

        let config = Config {
            server: ServerConfig {
                host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
            },
            queue: QueueConfig {
                queue_url: var("TASK_QUEUE_URL").unwrap_or_else(|| DEFAULT_QUEUE_URL.to_string()),
                handler_url: var("TASK_HANDLER_URL")
                    .unwrap_or_else(|| DEFAULT_HANDLER_URL.to_string()),
                dispatch_timeout_secs: parsed("DISPATCH_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
                forward_timeout_secs: parsed("FORWARD_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            },
            gcp,
        };

        config.validate()?;

        Ok(config)
    }

    /// Which queue backend this configuration selects
    pub fn backend_mode(&self) -> BackendMode {
        if self.gcp.is_some() {
            BackendMode::Managed
        } else {
            BackendMode::Local
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        validate_url("TASK_HANDLER_URL", &self.queue.handler_url)?;
        validate_url("TASK_QUEUE_URL", &self.queue.queue_url)?;

        if self.queue.dispatch_timeout_secs == 0 || self.queue.forward_timeout_secs == 0 {
            anyhow::bail!("HTTP timeouts must be greater than 0 seconds");
        }

        if let Some(gcp) = &self.gcp {
            if gcp.region.contains('/') || gcp.task_queue.contains('/') || gcp.project.contains('/') {
                anyhow::bail!("GCP project, region and queue names cannot contain '/'");
            }
            validate_url("CLOUD_TASKS_ENDPOINT", &gcp.tasks_endpoint)?;
            validate_url("GCP_METADATA_TOKEN_URL", &gcp.metadata_token_url)?;
        }

        Ok(())
    }
}

fn validate_url(name: &str, value: &str) -> anyhow::Result<()> {
    let url = url::Url::parse(value)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL ('{}'): {}", name, value, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("{} must use http or https, got '{}'", name, url.scheme());
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            queue: QueueConfig {
                queue_url: DEFAULT_QUEUE_URL.to_string(),
                handler_url: DEFAULT_HANDLER_URL.to_string(),
                dispatch_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
                forward_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            },
            gcp: None,
        }
    }
}
