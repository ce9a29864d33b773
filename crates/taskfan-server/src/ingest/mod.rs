//! Ingestion: file reference in, one dispatched task per row out
//!
//! - [`mapper`]: CSV rows to header-keyed records
//! - [`builder`]: records to task descriptors
//! - [`pipeline`]: the sequential map/build/dispatch loop
//! - [`routes`]: the HTTP trigger

pub mod builder;
pub mod mapper;
pub mod pipeline;
pub mod routes;

pub use builder::{BuildError, TaskBuilder};
pub use mapper::{Record, RowError, RowMapper};
pub use pipeline::{IngestError, IngestSummary, Pipeline};
pub use routes::{router, IngestState};
