use std::fmt;
use std::str::FromStr;

/// How raw header cells are turned into record keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderStyle {
    /// Lowercase, every run of characters outside `[a-z0-9_]` becomes a
    /// single `_`, and edge underscores are trimmed: `"Sample ID (m)"` ->
    /// `"sample_id_m"`.
    #[default]
    Underscore,
    /// Lowercase with all whitespace removed: `"Sample ID"` -> `"sampleid"`.
    Compact,
}

impl fmt::Display for HeaderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderStyle::Underscore => f.write_str("underscore"),
            HeaderStyle::Compact => f.write_str("compact"),
        }
    }
}

impl FromStr for HeaderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "underscore" => Ok(HeaderStyle::Underscore),
            "compact" => Ok(HeaderStyle::Compact),
            other => Err(format!(
                "unknown header style '{other}', expected 'underscore' or 'compact'"
            )),
        }
    }
}

/// Normalize text by replacing control characters with spaces and normalizing whitespace
/// Replaces newlines and control characters with spaces, collapses runs of
/// whitespace into one space and trims both ends
pub fn normalize_string(value: &str) -> String {
    return value
        .chars() // Process character by character
        .map(|c| {
            if c.is_control() {
                ' ' // Replace control characters (newlines, tabs, etc.) with spaces
            } else {
                c
            }
        })
        .collect::<String>()
        .split_whitespace() // Split on whitespace to normalize multiple spaces
        .collect::<Vec<&str>>()
        .join(" "); // Join back with single spaces
}

/// Turn a raw header cell into the key used in every record.
///
/// Both styles are total and idempotent: normalizing an already normalized
/// header returns it unchanged.
pub fn normalize_header(value: &str, style: HeaderStyle) -> String {
    match style {
        HeaderStyle::Underscore => {
            let lowered = normalize_string(value).to_lowercase();
            let mut normalized = String::with_capacity(lowered.len());
            let mut in_replaced_run = false;

            for c in lowered.chars() {
                if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                    normalized.push(c);
                    in_replaced_run = false;
                } else if !in_replaced_run {
                    normalized.push('_');
                    in_replaced_run = true;
                }
            }

            normalized.trim_matches('_').to_string()
        }
        HeaderStyle::Compact => value
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_string_collapses_whitespace() {
        assert_eq!(
            normalize_string("  Header\twith \n  breaks  "),
            "Header with breaks"
        );
        assert_eq!(normalize_string("   "), "");
    }

    #[test]
    fn test_underscore_style_basic() {
        assert_eq!(normalize_header("Location", HeaderStyle::Underscore), "location");
        assert_eq!(normalize_header("Value ", HeaderStyle::Underscore), "value");
        assert_eq!(
            normalize_header("Sample ID", HeaderStyle::Underscore),
            "sample_id"
        );
    }

    #[test]
    fn test_underscore_style_replaces_punctuation_runs() {
        assert_eq!(
            normalize_header("Temperature (°C)", HeaderStyle::Underscore),
            "temperature_c"
        );
        assert_eq!(
            normalize_header("Depth - max / m", HeaderStyle::Underscore),
            "depth_max_m"
        );
        assert_eq!(
            normalize_header("Location*", HeaderStyle::Underscore),
            "location"
        );
    }

    #[test]
    fn test_underscore_style_keeps_existing_underscores() {
        assert_eq!(
            normalize_header("already_normal", HeaderStyle::Underscore),
            "already_normal"
        );
        assert_eq!(normalize_header("a _b", HeaderStyle::Underscore), "a__b");
    }

    #[test]
    fn test_underscore_style_blank_input() {
        assert_eq!(normalize_header("", HeaderStyle::Underscore), "");
        assert_eq!(normalize_header(" \t ", HeaderStyle::Underscore), "");
        assert_eq!(normalize_header("***", HeaderStyle::Underscore), "");
    }

    #[test]
    fn test_compact_style_only_removes_whitespace() {
        assert_eq!(normalize_header("Sample ID", HeaderStyle::Compact), "sampleid");
        assert_eq!(
            normalize_header(" Depth (m) ", HeaderStyle::Compact),
            "depth(m)"
        );
    }

    #[test]
    fn test_header_style_from_str() {
        assert_eq!("Compact".parse::<HeaderStyle>(), Ok(HeaderStyle::Compact));
        assert_eq!(
            " underscore ".parse::<HeaderStyle>(),
            Ok(HeaderStyle::Underscore)
        );
        assert!("snake".parse::<HeaderStyle>().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 2000, ..ProptestConfig::default()
        })]

        #[test]
        fn test_underscore_style_is_idempotent(raw in "\\PC*") {
            let once = normalize_header(&raw, HeaderStyle::Underscore);
            prop_assert_eq!(normalize_header(&once, HeaderStyle::Underscore), once.clone());
            prop_assert!(once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        }

        #[test]
        fn test_compact_style_is_idempotent(raw in "[a-zA-Z0-9 \\t()*._-]*") {
            let once = normalize_header(&raw, HeaderStyle::Compact);
            prop_assert_eq!(normalize_header(&once, HeaderStyle::Compact), once);
        }
    }
}
