use clap::Parser;
use normalizer_lib::{
    BATCH_SIZE, CHUNK_SIZE, ErrorLogReporter, HeaderStyle, IngestError, Ingestor, IngestorBuilder,
    MAX_FILE_SIZE, REQUIRED_KEY_COLUMN, TracingReporter,
};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "excel-normalizer")]
#[command(about = "An HTTP service that converts uploaded Excel sheets into normalized JSON records")]
#[command(version)]
pub struct Settings {
    /// Address the HTTP server listens on
    #[arg(long, env = "EXCEL_NORMALIZER_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Largest accepted upload, in bytes
    #[arg(long, env = "EXCEL_NORMALIZER_MAX_FILE_SIZE", default_value_t = MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Rows per accumulation batch (0 keeps every row in one batch)
    #[arg(long, env = "EXCEL_NORMALIZER_BATCH_SIZE", default_value_t = BATCH_SIZE)]
    pub batch_size: usize,

    /// Size of each read while receiving an upload, in bytes
    #[arg(long, env = "EXCEL_NORMALIZER_CHUNK_SIZE", default_value_t = CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Column every row must fill in to be returned (matched after normalization)
    #[arg(long, env = "EXCEL_NORMALIZER_REQUIRED_COLUMN", default_value = REQUIRED_KEY_COLUMN)]
    pub required_column: String,

    /// Header normalization: "underscore" (sample_id) or "compact" (sampleid)
    #[arg(long, env = "EXCEL_NORMALIZER_HEADER_STYLE", default_value_t = HeaderStyle::Underscore)]
    pub header_style: HeaderStyle,

    /// Optional file failed uploads are appended to
    #[arg(long, env = "EXCEL_NORMALIZER_ERRORS_LOG")]
    pub errors_log: Option<PathBuf>,
}

impl Settings {
    pub fn ingestor_builder(&self) -> IngestorBuilder {
        let builder = IngestorBuilder::new()
            .max_file_size(self.max_file_size)
            .batch_size(Some(self.batch_size))
            .chunk_size(self.chunk_size)
            .required_column(self.required_column.clone())
            .header_style(self.header_style);

        match &self.errors_log {
            Some(path) => builder.reporter((TracingReporter, ErrorLogReporter::new(path))),
            None => builder.reporter(TracingReporter),
        }
    }

    pub fn build_ingestor(&self) -> Result<Ingestor, IngestError> {
        self.ingestor_builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["excel-normalizer"]).unwrap();
        let ingestor = settings.build_ingestor().unwrap();

        assert_eq!(settings.bind.port(), 8000);
        assert_eq!(ingestor.max_file_size(), MAX_FILE_SIZE);
        assert_eq!(ingestor.batch_size(), Some(BATCH_SIZE));
        assert_eq!(ingestor.required_column(), "location");
        assert!(settings.errors_log.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::try_parse_from([
            "excel-normalizer",
            "--bind",
            "127.0.0.1:9000",
            "--batch-size",
            "0",
            "--max-file-size",
            "1024",
            "--required-column",
            "Site Name",
            "--header-style",
            "compact",
        ])
        .unwrap();
        let ingestor = settings.build_ingestor().unwrap();

        assert_eq!(settings.bind.to_string(), "127.0.0.1:9000");
        assert_eq!(ingestor.batch_size(), None);
        assert_eq!(ingestor.max_file_size(), 1024);
        assert_eq!(ingestor.required_column(), "sitename");
        assert_eq!(ingestor.header_style(), HeaderStyle::Compact);
    }

    #[test]
    fn test_invalid_header_style_is_rejected() {
        let result =
            Settings::try_parse_from(["excel-normalizer", "--header-style", "snake_case"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_chunk_size_fails_to_build() {
        let settings =
            Settings::try_parse_from(["excel-normalizer", "--chunk-size", "0"]).unwrap();
        assert!(matches!(
            settings.build_ingestor(),
            Err(IngestError::InvalidConfig(_))
        ));
    }
}
