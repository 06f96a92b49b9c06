use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

pub fn get_utc_iso_datetime() -> String {
    let timestamp = chrono::Utc::now().to_rfc3339();
    return timestamp;
}

/// ISO-8601 text for a date cell; the time part is omitted at midnight.
pub fn format_cell_datetime(datetime: NaiveDateTime) -> String {
    if datetime.time() == NaiveTime::MIN {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// `[-]HH:MM:SS` text for a duration cell, rounded to the second.
pub fn format_cell_duration(duration: TimeDelta) -> String {
    let total_seconds = (duration.num_milliseconds() as f64 / 1000.0).round() as i64;
    let sign = if total_seconds < 0 { "-" } else { "" };
    let total_seconds = total_seconds.unsigned_abs();
    format!(
        "{sign}{:02}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds / 60) % 60,
        total_seconds % 60
    )
}
