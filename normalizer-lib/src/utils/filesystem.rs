use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::utils::get_utc_iso_datetime;

/// Centralized function to write error messages to an errors log file
///
/// Failures to open or write the log are ignored; the log is a diagnostic
/// side channel and never changes the outcome of an upload.
///
/// # Arguments
/// * `path` - The log file, created on first use and appended to afterwards
/// * `error_type` - A description of the error type/category (e.g., "Upload Ingestion Error")
/// * `error_message` - The actual error message content
pub fn write_error_to_log(path: &Path, error_type: &str, error_message: &str) {
    let timestamp = get_utc_iso_datetime();
    let log_entry = format!("\n[{}] {}:\n{}\n", timestamp, error_type, error_message);

    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{}", log_entry);
    }
}
