//! Diagnostic side channel for the ingestion pipeline.
//!
//! The pipeline never logs on its own; it calls the [`Reporter`] it was
//! built with. Every method has a no-op default so implementations only
//! override the events they care about.

use std::path::PathBuf;

use crate::error::{IngestError, Stage};
use crate::utils::write_error_to_log;

pub trait Reporter: Send + Sync {
    /// Byte intake finished with `total` bytes buffered.
    fn bytes_received(&self, _total: u64) {}

    fn workbook_opened(&self, _sheet_count: usize, _sheet_name: &str) {}

    fn headers_normalized(&self, _headers: &[String]) {}

    fn batch_flushed(&self, _batch_len: usize, _total: usize) {}

    fn finished(&self, _records: usize, _skipped: usize) {}

    fn failed(&self, _stage: Stage, _error: &IngestError) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {}

/// Emits structured `tracing` events. Attach context such as the uploaded
/// filename with a span around the pipeline call.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn bytes_received(&self, total: u64) {
        tracing::info!(bytes = total, "upload received");
    }

    fn workbook_opened(&self, sheet_count: usize, sheet_name: &str) {
        tracing::info!(sheet_count, sheet = sheet_name, "workbook loaded");
    }

    fn headers_normalized(&self, headers: &[String]) {
        tracing::info!(?headers, "normalized columns");
    }

    fn batch_flushed(&self, batch_len: usize, total: usize) {
        tracing::debug!(batch_len, total, "batch flushed");
    }

    fn finished(&self, records: usize, skipped: usize) {
        tracing::info!(records, skipped, "records processed");
    }

    fn failed(&self, stage: Stage, error: &IngestError) {
        if error.is_client_error() {
            tracing::warn!(%stage, %error, "upload rejected");
        } else {
            tracing::error!(%stage, %error, "upload failed");
        }
    }
}

/// Appends failures to an errors log file; other events are ignored.
#[derive(Debug, Clone)]
pub struct ErrorLogReporter {
    path: PathBuf,
}

impl ErrorLogReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ErrorLogReporter { path: path.into() }
    }
}

impl Reporter for ErrorLogReporter {
    fn failed(&self, stage: Stage, error: &IngestError) {
        write_error_to_log(
            &self.path,
            &format!("Upload Ingestion Error ({stage})"),
            &error.to_string(),
        );
    }
}

/// Fans every event out to both reporters, first `A` then `B`.
impl<A: Reporter, B: Reporter> Reporter for (A, B) {
    fn bytes_received(&self, total: u64) {
        self.0.bytes_received(total);
        self.1.bytes_received(total);
    }

    fn workbook_opened(&self, sheet_count: usize, sheet_name: &str) {
        self.0.workbook_opened(sheet_count, sheet_name);
        self.1.workbook_opened(sheet_count, sheet_name);
    }

    fn headers_normalized(&self, headers: &[String]) {
        self.0.headers_normalized(headers);
        self.1.headers_normalized(headers);
    }

    fn batch_flushed(&self, batch_len: usize, total: usize) {
        self.0.batch_flushed(batch_len, total);
        self.1.batch_flushed(batch_len, total);
    }

    fn finished(&self, records: usize, skipped: usize) {
        self.0.finished(records, skipped);
        self.1.finished(records, skipped);
    }

    fn failed(&self, stage: Stage, error: &IngestError) {
        self.0.failed(stage, error);
        self.1.failed(stage, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_error_log_reporter_appends_failures() {
        let path = std::env::temp_dir().join(format!(
            "normalizer-lib-errors-{}.log",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);

        let reporter = (NoopReporter, ErrorLogReporter::new(&path));
        reporter.failed(Stage::Intake, &IngestError::PayloadTooLarge { limit: 42 });
        reporter.failed(
            Stage::Decode,
            &IngestError::UnsupportedFormat("not a spreadsheet".to_string()),
        );

        let contents = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert!(contents.contains("Upload Ingestion Error (intake)"));
        assert!(contents.contains("maximum allowed size of 42 bytes"));
        assert!(contents.contains("Upload Ingestion Error (decode)"));
        assert!(contents.contains("not a spreadsheet"));
    }
}
