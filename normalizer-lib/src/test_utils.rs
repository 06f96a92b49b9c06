// Test utilities available to both unit and integration tests
// Only compiled when testing

use rust_xlsxwriter::{Formula, Workbook as XlsxWriter};
use serde_json::Value;

use crate::ingestor::{Ingestor, IngestorBuilder};

/// Build an in-memory xlsx file with one sheet per `(name, rows)` pair.
///
/// `rows` is a JSON array of arrays. Strings starting with `=` are written
/// as formulas, `null` leaves the cell empty.
pub fn build_xlsx(sheets: &[(&str, Value)]) -> Result<Vec<u8>, anyhow::Error> {
    let mut workbook = XlsxWriter::new();

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;

        let rows = rows
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Fixture rows must be a JSON array"))?;
        for (row_index, row) in rows.iter().enumerate() {
            let cells = row
                .as_array()
                .ok_or_else(|| anyhow::anyhow!("Fixture row {row_index} must be a JSON array"))?;
            for (col_index, cell) in cells.iter().enumerate() {
                let (row_index, col_index) = (row_index as u32, col_index as u16);
                match cell {
                    Value::Null => {}
                    Value::String(s) if s.starts_with('=') => {
                        worksheet.write_formula(row_index, col_index, Formula::new(s.as_str()))?;
                    }
                    Value::String(s) => {
                        worksheet.write_string(row_index, col_index, s.as_str())?;
                    }
                    Value::Number(n) => {
                        let number = n
                            .as_f64()
                            .ok_or_else(|| anyhow::anyhow!("Fixture number {n} is not an f64"))?;
                        worksheet.write_number(row_index, col_index, number)?;
                    }
                    Value::Bool(b) => {
                        worksheet.write_boolean(row_index, col_index, *b)?;
                    }
                    other => anyhow::bail!("Unsupported fixture cell: {other}"),
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Single-sheet xlsx fixture; panics on malformed fixture data.
#[allow(dead_code)]
pub fn xlsx_fixture(rows: Value) -> Vec<u8> {
    build_xlsx(&[("Sheet1", rows)]).unwrap()
}

/// Ingestor with the default configuration except for the batch size.
#[allow(dead_code)]
pub fn create_test_ingestor(batch_size: Option<usize>) -> Ingestor {
    IngestorBuilder::new().batch_size(batch_size).build().unwrap()
}
