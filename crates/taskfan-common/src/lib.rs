//! Taskfan Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types and utilities for the taskfan services.
//!
//! # Overview
//!
//! - **Task wire model**: the JSON task-creation request exchanged between the
//!   dispatcher, the local queue emulator and the managed queue REST API
//! - **Errors**: wire-level error and result types
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use taskfan_common::task::{CreateTaskRequest, HttpMethod, QueuePath};
//!
//! let queue = QueuePath::new("demo", "europe-west1", "csv-queue");
//! let request = CreateTaskRequest::http(
//!     Some(&queue),
//!     HttpMethod::Post,
//!     "http://localhost:8083",
//!     br#"{"a":"1"}"#.to_vec(),
//! );
//! let bytes = request.to_json_bytes()?;
//! # Ok::<(), taskfan_common::WireError>(())
//! ```

pub mod error;
pub mod logging;
pub mod task;

pub use error::{Result, WireError};
