use serde_json::Value;

use crate::Record;
use crate::headers::HeaderIndex;
use crate::workbook::Row;

/// Outcome of projecting one data row.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Keep(Record),
    /// The required key cell was empty, null or missing.
    Skip,
}

/// Turns raw rows into records keyed by the normalized headers.
pub struct RowProjector<'h> {
    headers: &'h HeaderIndex,
    key_position: usize,
}

impl<'h> RowProjector<'h> {
    pub fn new(headers: &'h HeaderIndex) -> Self {
        RowProjector {
            key_position: headers.key_position(),
            headers,
        }
    }

    /// Rows shorter than the header get `null` for the missing columns;
    /// cells past the last header are ignored.
    pub fn project(&self, row: Row) -> Projection {
        if row.get(self.key_position).is_none_or(is_blank) {
            return Projection::Skip;
        }

        let mut record = Record::with_capacity(self.headers.len());
        let mut cells = row.into_iter();
        for name in self.headers.names() {
            record.insert(name.clone(), cells.next().unwrap_or(Value::Null));
        }

        Projection::Keep(record)
    }
}

/// Null, or text that is empty once whitespace is trimmed.
pub(crate) fn is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::HeaderStyle;
    use serde_json::json;

    fn headers(names: Value) -> HeaderIndex {
        let row = names.as_array().cloned().unwrap_or_default();
        HeaderIndex::from_row(&row, HeaderStyle::Underscore, "location").unwrap()
    }

    fn kept(projection: Projection) -> Record {
        match projection {
            Projection::Keep(record) => record,
            Projection::Skip => panic!("Row should have been kept"),
        }
    }

    #[test]
    fn test_row_is_zipped_with_headers() {
        let headers = headers(json!(["Location", "Value "]));
        let projector = RowProjector::new(&headers);

        let record = kept(projector.project(vec![json!("NYC"), json!(1)]));
        assert_eq!(Value::Object(record), json!({"location": "NYC", "value": 1}));
    }

    #[test]
    fn test_rows_without_key_are_skipped() {
        let headers = headers(json!(["Value", "Location"]));
        let projector = RowProjector::new(&headers);

        assert_eq!(projector.project(vec![json!(2), Value::Null]), Projection::Skip);
        assert_eq!(projector.project(vec![json!(2), json!("")]), Projection::Skip);
        assert_eq!(projector.project(vec![json!(2), json!("   ")]), Projection::Skip);
        // Row ends before the key column
        assert_eq!(projector.project(vec![json!(2)]), Projection::Skip);
        assert_eq!(projector.project(Vec::new()), Projection::Skip);
    }

    #[test]
    fn test_falsy_scalars_are_not_blank() {
        let headers = headers(json!(["Location"]));
        let projector = RowProjector::new(&headers);

        assert!(matches!(projector.project(vec![json!(0)]), Projection::Keep(_)));
        assert!(matches!(projector.project(vec![json!(false)]), Projection::Keep(_)));
    }

    #[test]
    fn test_short_rows_are_padded_with_null() {
        let headers = headers(json!(["Location", "Value", "Notes"]));
        let projector = RowProjector::new(&headers);

        let record = kept(projector.project(vec![json!("LA")]));
        assert_eq!(
            Value::Object(record),
            json!({"location": "LA", "value": null, "notes": null})
        );
    }

    #[test]
    fn test_extra_cells_are_ignored() {
        let headers = headers(json!(["Location", "Value"]));
        let projector = RowProjector::new(&headers);

        let record = kept(projector.project(vec![json!("LA"), json!(3), json!("stray")]));
        assert_eq!(record.len(), 2);
        assert_eq!(record.keys().collect::<Vec<_>>(), ["location", "value"]);
    }
}
