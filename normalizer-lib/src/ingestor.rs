use std::num::NonZeroUsize;
use std::sync::Arc;
use serde_json::Value;
use tokio::io::AsyncRead;

use crate::batch::BatchAccumulator;
use crate::error::{IngestError, Stage};
use crate::headers::HeaderIndex;
use crate::intake::read_chunked;
use crate::report::{NoopReporter, Reporter};
use crate::rows::{Projection, RowProjector};
use crate::utils::{HeaderStyle, normalize_header};
use crate::workbook::Workbook;
use crate::{
    ACCEPTED_EXTENSIONS, BATCH_SIZE, CHUNK_SIZE, MAX_FILE_SIZE, REQUIRED_KEY_COLUMN, Record,
};

pub struct IngestorBuilder {
    max_file_size: u64,
    batch_size: Option<usize>,
    chunk_size: usize,
    required_column: String,
    header_style: HeaderStyle,
    accepted_extensions: Vec<String>,
    reporter: Arc<dyn Reporter>,
}

impl Default for IngestorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestorBuilder {
    /// Create a builder with the default limits: 50 MiB uploads, batches of
    /// 10 000 rows, 2 MiB reads, `location` as the required column and
    /// `.xlsx`/`.xls` as accepted extensions.
    pub fn new() -> Self {
        IngestorBuilder {
            max_file_size: MAX_FILE_SIZE,
            batch_size: Some(BATCH_SIZE),
            chunk_size: CHUNK_SIZE,
            required_column: REQUIRED_KEY_COLUMN.to_string(),
            header_style: HeaderStyle::default(),
            accepted_extensions: ACCEPTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            reporter: Arc::new(NoopReporter),
        }
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// `None` (or `Some(0)`) accumulates every record in a single batch.
    pub fn batch_size(mut self, rows: Option<usize>) -> Self {
        self.batch_size = rows;
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Raw column name; it goes through the same normalization as the headers.
    pub fn required_column(mut self, column: impl Into<String>) -> Self {
        self.required_column = column.into();
        self
    }

    pub fn header_style(mut self, style: HeaderStyle) -> Self {
        self.header_style = style;
        self
    }

    pub fn accepted_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Build the Ingestor, validating the configuration
    pub fn build(self) -> Result<Ingestor, IngestError> {
        if self.max_file_size == 0 {
            return Err(IngestError::InvalidConfig(
                "max file size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.accepted_extensions.is_empty() {
            return Err(IngestError::InvalidConfig(
                "at least one file extension must be accepted".to_string(),
            ));
        }

        let required_column = normalize_header(&self.required_column, self.header_style);
        if required_column.is_empty() {
            return Err(IngestError::InvalidConfig(format!(
                "required column '{}' is empty after normalization",
                self.required_column
            )));
        }

        Ok(Ingestor {
            max_file_size: self.max_file_size,
            batch_size: self.batch_size.and_then(NonZeroUsize::new),
            chunk_size: self.chunk_size,
            required_column,
            header_style: self.header_style,
            accepted_extensions: self.accepted_extensions,
            reporter: self.reporter,
        })
    }
}

/// Runs uploads through intake, decoding, header normalization, row
/// filtering and batched accumulation.
///
/// An `Ingestor` holds configuration only; concurrent uploads share nothing
/// mutable and may use the same instance.
pub struct Ingestor {
    max_file_size: u64,
    batch_size: Option<NonZeroUsize>,
    chunk_size: usize,
    required_column: String,
    header_style: HeaderStyle,
    accepted_extensions: Vec<String>,
    reporter: Arc<dyn Reporter>,
}

impl Ingestor {
    //////////////////////////////////////////////////////////////
    ///  Public API
    //////////////////////////////////////////////////////////////

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.batch_size.map(NonZeroUsize::get)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Normalized name of the required key column
    pub fn required_column(&self) -> &str {
        &self.required_column
    }

    pub fn header_style(&self) -> HeaderStyle {
        self.header_style
    }

    pub fn accepted_extensions(&self) -> &[String] {
        &self.accepted_extensions
    }

    /// Case-sensitive suffix check against the accepted extensions.
    pub fn check_extension(&self, filename: &str) -> Result<(), IngestError> {
        if self
            .accepted_extensions
            .iter()
            .any(|extension| filename.ends_with(extension.as_str()))
        {
            return Ok(());
        }

        let error = IngestError::InvalidExtension {
            filename: filename.to_string(),
            accepted: self.accepted_extensions.clone(),
        };
        self.reporter.failed(Stage::Extension, &error);
        Err(error)
    }

    /// Buffer an upload in `chunk_size` reads, enforcing `max_file_size`.
    pub async fn read_upload<R>(&self, reader: R) -> Result<Vec<u8>, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        let contents = read_chunked(reader, self.chunk_size, self.max_file_size)
            .await
            .inspect_err(|e| self.reporter.failed(Stage::Intake, e))?;
        self.reporter.bytes_received(contents.len() as u64);
        Ok(contents)
    }

    /// Decode a buffered upload and return the retained records in sheet
    /// order. Runs to completion without suspending; nothing partial is
    /// returned on failure.
    pub fn ingest_bytes(&self, bytes: Vec<u8>) -> Result<Vec<Record>, IngestError> {
        self.process_workbook(bytes)
            .inspect_err(|e| self.reporter.failed(e.stage(), e))
    }

    /// The whole pipeline for one upload: extension check, intake, then
    /// decoding on the current thread.
    pub async fn ingest<R>(&self, filename: &str, reader: R) -> Result<Vec<Record>, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        self.check_extension(filename)?;
        let bytes = self.read_upload(reader).await?;
        self.ingest_bytes(bytes)
    }

    //////////////////////////////////////////////////////////////
    ///  Private methods
    //////////////////////////////////////////////////////////////

    fn process_workbook(&self, bytes: Vec<u8>) -> Result<Vec<Record>, IngestError> {
        let mut workbook = Workbook::open(bytes)?;
        let sheet_names = workbook.sheet_names();
        if let Some(first) = sheet_names.first() {
            self.reporter.workbook_opened(sheet_names.len(), first);
        }

        let mut rows = workbook.first_sheet_rows()?;

        // The first row with any value holds the headers; no data row is read
        // before they validate
        let header_row = rows
            .find(|row| !row.as_ref().is_ok_and(|cells| cells.iter().all(Value::is_null)))
            .transpose()?
            .unwrap_or_default();
        let headers = HeaderIndex::from_row(&header_row, self.header_style, &self.required_column)?;
        self.reporter.headers_normalized(headers.names());

        let projector = RowProjector::new(&headers);
        let mut accumulator = BatchAccumulator::new(self.batch_size, self.reporter.as_ref());
        let mut skipped = 0usize;

        for row in rows {
            match projector.project(row?) {
                Projection::Keep(record) => accumulator.push(record),
                Projection::Skip => skipped += 1,
            }
        }

        let records = accumulator.finish();
        self.reporter.finished(records.len(), skipped);

        return Ok(records);
    }
}
