mod datetime;
mod filesystem;
mod string;

pub use datetime::{format_cell_datetime, format_cell_duration, get_utc_iso_datetime};
pub use filesystem::write_error_to_log;
pub use string::{HeaderStyle, normalize_header, normalize_string};
