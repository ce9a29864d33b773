//! Taskfan Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Fans a CSV file out into one HTTP task per row.
//!
//! # Services
//!
//! - **File handler** (`taskfan-filehandler`): `GET /?f=<file>` reads the file,
//!   maps each row to a JSON object and dispatches it as a task
//! - **Task queue emulator** (`taskfan-taskqueue`): `POST /` takes a
//!   task-creation request and performs its HTTP request right away
//! - **Task handler** (`taskfan-taskhandler`): echoes task bodies, for local runs
//!
//! # Backends
//!
//! With `GCP_PROJECT` set, tasks go to a managed Cloud Tasks queue. Without
//! it they are posted to the emulator at `TASK_QUEUE_URL`. The choice is made
//! once at startup; see [`dispatch::from_config`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskfan_server::{config::Config, dispatch, ingest, server, storage::UnimplementedStore};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let shutdown = CancellationToken::new();
//!     let pipeline = ingest::Pipeline::new(
//!         ingest::TaskBuilder::new(config.queue.handler_url.clone()),
//!         dispatch::from_config(&config)?,
//!         shutdown.child_token(),
//!     );
//!     let app = ingest::router(ingest::IngestState::new(pipeline, Arc::new(UnimplementedStore)));
//!     server::serve(app, &config.server, shutdown).await
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod emulator;
pub mod error;
pub mod handler;
pub mod ingest;
pub mod middleware;
pub mod server;
pub mod storage;

pub use error::AppError;

/// Liveness probe shared by every service
pub async fn health() -> &'static str {
    "OK"
}
