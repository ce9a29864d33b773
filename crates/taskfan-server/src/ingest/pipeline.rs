//! Row-to-task dispatch pipeline
//!
//! Reads one row, builds its task, dispatches it, and only then reads the
//! next row. The first fatal error stops the run; tasks already dispatched
//! stay dispatched.

use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::builder::{BuildError, TaskBuilder};
use super::mapper::{RowError, RowMapper};
use crate::dispatch::{DispatchError, SharedDispatcher};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Rows(#[from] RowError),

    #[error("failed to build task on row {line}: {source}")]
    Build {
        line: u64,
        #[source]
        source: BuildError,
    },

    #[error("failed to queue task on row {line}: {source}")]
    Dispatch {
        line: u64,
        #[source]
        source: DispatchError,
    },

    #[error("ingestion cancelled after {dispatched} tasks")]
    Cancelled { dispatched: usize },
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub rows_dispatched: usize,
    /// Rows whose field count differed from the header
    pub rows_mismatched: usize,
}

pub struct Pipeline {
    builder: TaskBuilder,
    dispatcher: SharedDispatcher,
    cancel: CancellationToken,
}

impl Pipeline {
    /// `cancel` is checked between rows; firing it stops the run before the
    /// next row is read.
    pub fn new(builder: TaskBuilder, dispatcher: SharedDispatcher, cancel: CancellationToken) -> Self {
        Self {
            builder,
            dispatcher,
            cancel,
        }
    }

    pub fn dispatcher(&self) -> &SharedDispatcher {
        &self.dispatcher
    }

    pub async fn run_file(&self, path: &Path) -> Result<IngestSummary, IngestError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| IngestError::Open {
                path: path.display().to_string(),
                source,
            })?;

        self.run(BufReader::new(file)).await
    }

    #[instrument(skip_all, fields(mode = %self.dispatcher.mode()))]
    pub async fn run<R>(&self, input: R) -> Result<IngestSummary, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut rows = RowMapper::new(input).await?;
        let mut summary = IngestSummary::default();

        loop {
            if self.cancel.is_cancelled() {
                return Err(IngestError::Cancelled {
                    dispatched: summary.rows_dispatched,
                });
            }

            let Some(row) = rows.next_row().await? else {
                break;
            };

            if row.field_mismatch {
                summary.rows_mismatched += 1;
            }

            let task = self
                .builder
                .build(&row.record)
                .map_err(|source| IngestError::Build {
                    line: row.line,
                    source,
                })?;

            self.dispatcher
                .submit(&task)
                .await
                .map_err(|source| IngestError::Dispatch {
                    line: row.line,
                    source,
                })?;

            summary.rows_dispatched += 1;
        }

        info!(
            rows_dispatched = summary.rows_dispatched,
            rows_mismatched = summary.rows_mismatched,
            "Input processed"
        );

        Ok(summary)
    }
}
