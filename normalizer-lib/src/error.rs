use std::fmt;
use thiserror::Error;

/// Pipeline step an error was raised in, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extension,
    Intake,
    Decode,
    Headers,
    Rows,
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extension => "extension",
            Stage::Intake => "intake",
            Stage::Decode => "decode",
            Stage::Headers => "headers",
            Stage::Rows => "rows",
            Stage::Config => "config",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Only Excel files ({}) are supported, got '{filename}'", .accepted.join(", "))]
    InvalidExtension {
        filename: String,
        accepted: Vec<String>,
    },

    #[error("File is larger than the maximum allowed size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt workbook: {0}")]
    CorruptWorkbook(String),

    #[error("Column '{column}' not found in the Excel file. Available columns: {available:?}")]
    MissingRequiredColumn {
        column: String,
        available: Vec<String>,
    },

    #[error(
        "Column '{column}' appears more than once in the Excel file (columns {})",
        .positions.iter().map(|p| (p + 1).to_string()).collect::<Vec<_>>().join(", ")
    )]
    DuplicateRequiredColumn {
        column: String,
        positions: Vec<usize>,
    },

    #[error("Failed to read the uploaded file: {0}")]
    Intake(#[source] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Error processing file: {0}")]
    Processing(String),
}

impl IngestError {
    /// HTTP-style status code a caller should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            IngestError::InvalidExtension { .. }
            | IngestError::MissingRequiredColumn { .. }
            | IngestError::DuplicateRequiredColumn { .. }
            | IngestError::Intake(_) => 400,
            IngestError::PayloadTooLarge { .. } => 413,
            IngestError::UnsupportedFormat(_)
            | IngestError::CorruptWorkbook(_)
            | IngestError::InvalidConfig(_)
            | IngestError::Processing(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    pub fn stage(&self) -> Stage {
        match self {
            IngestError::InvalidExtension { .. } => Stage::Extension,
            IngestError::PayloadTooLarge { .. } | IngestError::Intake(_) => Stage::Intake,
            IngestError::UnsupportedFormat(_) | IngestError::CorruptWorkbook(_) => Stage::Decode,
            IngestError::MissingRequiredColumn { .. }
            | IngestError::DuplicateRequiredColumn { .. } => Stage::Headers,
            IngestError::InvalidConfig(_) => Stage::Config,
            IngestError::Processing(_) => Stage::Rows,
        }
    }
}
