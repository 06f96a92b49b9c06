use serde_json::Value;

use crate::error::IngestError;
use crate::utils::{HeaderStyle, normalize_header};

/// Normalized header names, index-aligned with the sheet's columns, plus the
/// resolved position of the required key column.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderIndex {
    names: Vec<String>,
    key_position: usize,
}

impl HeaderIndex {
    /// Build the index from the first row of the sheet.
    ///
    /// `required` must already be normalized with the same `style`. Trailing
    /// header cells that normalize to nothing are dropped; blank headers in
    /// the middle keep an empty name so positions stay aligned.
    ///
    /// # Errors
    /// * `MissingRequiredColumn` when no header normalizes to `required`
    /// * `DuplicateRequiredColumn` when more than one does
    pub fn from_row(row: &[Value], style: HeaderStyle, required: &str) -> Result<Self, IngestError> {
        let mut names: Vec<String> = row
            .iter()
            .map(|cell| normalize_header(&header_text(cell), style))
            .collect();

        while names.last().is_some_and(|name| name.is_empty()) {
            names.pop();
        }

        let positions: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_str() == required)
            .map(|(position, _)| position)
            .collect();

        match positions.as_slice() {
            [key_position] => Ok(HeaderIndex {
                key_position: *key_position,
                names,
            }),
            [] => Err(IngestError::MissingRequiredColumn {
                column: required.to_string(),
                available: names,
            }),
            _ => Err(IngestError::DuplicateRequiredColumn {
                column: required.to_string(),
                positions,
            }),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column position of the required key, resolved once per upload.
    pub fn key_position(&self) -> usize {
        self.key_position
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Header cells may hold numbers or booleans; use their text form.
fn header_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
