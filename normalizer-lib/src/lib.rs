#![allow(clippy::needless_return)]

mod batch;
mod error;
mod headers;
mod ingestor;
mod intake;
pub mod report;
mod rows;
pub mod utils;
mod workbook;

// Test utilities - only compiled when testing or with test feature
// #[cfg(test)] alone doesn't work for integration tests (they're external crates)
// The feature flag makes it available to integration tests via dev-dependencies
#[cfg(any(test, feature = "test"))]
pub mod test_utils;

pub use batch::BatchAccumulator;
pub use error::{IngestError, Stage};
pub use headers::HeaderIndex;
pub use ingestor::{Ingestor, IngestorBuilder};
pub use intake::read_chunked;
pub use report::{ErrorLogReporter, NoopReporter, Reporter, TracingReporter};
pub use rows::{Projection, RowProjector};
pub use utils::{HeaderStyle, normalize_header};
pub use workbook::{Row, SheetRows, Workbook};

/// One retained row: normalized header name to cell scalar, in column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub const ERRORS_LOG_FILE: &str = "errors.log";

/// Uploads above this many bytes are rejected (50 MiB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Rows held in one working batch before they are moved to the result.
pub const BATCH_SIZE: usize = 10_000;

/// Read unit used while pulling the upload (2 MiB).
pub const CHUNK_SIZE: usize = 2 * 1024 * 1024;

/// Normalized header every sheet must carry.
pub const REQUIRED_KEY_COLUMN: &str = "location";

pub const ACCEPTED_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];
