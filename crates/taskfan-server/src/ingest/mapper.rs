//! Row Mapper: delimited input to header-keyed records

use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::warn;

/// Column name to cell value for a single row.
pub type Record = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum RowError {
    #[error("input file is empty")]
    EmptyInput,

    #[error("failed to process line {line}: {source}")]
    MalformedRow {
        line: u64,
        #[source]
        source: csv_async::Error,
    },
}

/// One mapped row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRow {
    /// 1-based line number; the header is line 1
    pub line: u64,
    pub record: Record,
    /// Row and header field counts differed; the record was truncated
    pub field_mismatch: bool,
}

/// Streams records out of a CSV source, one row at a time.
///
/// Rows with a field count different from the header are kept: only the
/// first `min(row, header)` columns are mapped and a warning is logged.
pub struct RowMapper<R> {
    reader: AsyncReader<R>,
    header: StringRecord,
    row: StringRecord,
    line: u64,
}

impl<R> RowMapper<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Read the header line. Fails with [`RowError::EmptyInput`] when there
    /// is none.
    pub async fn new(input: R) -> Result<Self, RowError> {
        let mut reader = AsyncReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .create_reader(input);

        let header = reader
            .headers()
            .await
            .map_err(|source| RowError::MalformedRow { line: 1, source })?
            .clone();

        if header.is_empty() {
            return Err(RowError::EmptyInput);
        }

        Ok(Self {
            reader,
            header,
            row: StringRecord::new(),
            line: 1,
        })
    }

    /// Next record, or `None` at end of input.
    pub async fn next_row(&mut self) -> Result<Option<MappedRow>, RowError> {
        self.line += 1;
        let line = self.line;

        let has_row = self
            .reader
            .read_record(&mut self.row)
            .await
            .map_err(|source| RowError::MalformedRow { line, source })?;

        if !has_row {
            return Ok(None);
        }

        let field_mismatch = self.row.len() != self.header.len();
        if field_mismatch {
            warn!(
                line,
                expected = self.header.len(),
                found = self.row.len(),
                "Unexpected number of fields"
            );
        }

        Ok(Some(MappedRow {
            line,
            record: map_row(&self.header, &self.row),
            field_mismatch,
        }))
    }
}

/// Pair header names with row values, stopping at the shorter of the two.
pub fn map_row(header: &StringRecord, row: &StringRecord) -> Record {
    header
        .iter()
        .zip(row.iter())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
