use calamine::{Data, DataRef, ExcelDateTime, Range, Reader, Sheets, open_workbook_auto_from_rs};
use serde_json::{Number, Value};
use std::fmt;
use std::io::Cursor;

use crate::error::IngestError;
use crate::utils::{format_cell_datetime, format_cell_duration};

/// One sheet row as scalar cells, indexed by absolute column (column A = 0).
pub type Row = Vec<Value>;

type Source = Cursor<Vec<u8>>;

/// `(row, column, value)` as produced by the streaming cell readers
type PositionedCell = (u32, u32, Value);

/// Container formats recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    /// xlsx, xlsm, xlsb and ods
    Zip,
    /// Legacy xls
    Compound,
}

impl Container {
    fn sniff(bytes: &[u8]) -> Option<Self> {
        const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
        const COMPOUND_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

        if bytes.starts_with(ZIP_MAGIC) {
            Some(Container::Zip)
        } else if bytes.starts_with(COMPOUND_MAGIC) {
            Some(Container::Compound)
        } else {
            None
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Zip => f.write_str("zip"),
            Container::Compound => f.write_str("OLE compound"),
        }
    }
}

/// A decoded spreadsheet. Only cached cell values are ever read: formulas
/// are not evaluated and macro projects are never loaded.
pub struct Workbook {
    sheets: Sheets<Source>,
}

impl Workbook {
    /// Decode an uploaded file. The buffer is owned by the workbook and
    /// released with it.
    ///
    /// # Errors
    /// * `UnsupportedFormat` when the bytes are not a spreadsheet container
    /// * `CorruptWorkbook` when they look like one but cannot be decoded
    pub fn open(bytes: Vec<u8>) -> Result<Self, IngestError> {
        let container = Container::sniff(&bytes);

        match open_workbook_auto_from_rs(Cursor::new(bytes)) {
            Ok(sheets) => Ok(Workbook { sheets }),
            Err(e) => match container {
                Some(container) => Err(IngestError::CorruptWorkbook(format!(
                    "{container} container could not be decoded as a workbook: {e}"
                ))),
                None => Err(IngestError::UnsupportedFormat(format!(
                    "file is not an Excel workbook: {e}"
                ))),
            },
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Rows of the first sheet, in order, each produced once.
    ///
    /// xlsx and xlsb sheets are streamed cell by cell; xls and ods sheets
    /// are decoded as a block by the underlying reader and then walked.
    pub fn first_sheet_rows(&mut self) -> Result<SheetRows<'_>, IngestError> {
        let name = self
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::CorruptWorkbook("workbook has no sheets".to_string()))?;

        let inner: Box<dyn Iterator<Item = Result<Row, IngestError>> + '_> = match &mut self.sheets
        {
            Sheets::Xlsx(xlsx) => {
                let mut reader = xlsx.worksheet_cells_reader(&name).map_err(sheet_error)?;
                Box::new(CellRows::new(move || {
                    let cell = reader.next_cell().map_err(sheet_error)?;
                    Ok(cell.map(|cell| {
                        let (row, column) = cell.get_position();
                        (row, column, data_ref_to_json(cell.get_value()))
                    }))
                }))
            }
            Sheets::Xlsb(xlsb) => {
                let mut reader = xlsb.worksheet_cells_reader(&name).map_err(sheet_error)?;
                Box::new(CellRows::new(move || {
                    let cell = reader.next_cell().map_err(sheet_error)?;
                    Ok(cell.map(|cell| {
                        let (row, column) = cell.get_position();
                        (row, column, data_ref_to_json(cell.get_value()))
                    }))
                }))
            }
            Sheets::Xls(xls) => Box::new(RangeRows::new(
                xls.worksheet_range(&name).map_err(sheet_error)?,
            )),
            Sheets::Ods(ods) => Box::new(RangeRows::new(
                ods.worksheet_range(&name).map_err(sheet_error)?,
            )),
        };

        Ok(SheetRows {
            inner,
            exhausted: false,
        })
    }
}

fn sheet_error(error: impl fmt::Display) -> IngestError {
    IngestError::CorruptWorkbook(format!("error reading the first sheet: {error}"))
}

/// Forward-only, single-pass sequence of sheet rows. Stops for good after
/// the first error.
pub struct SheetRows<'a> {
    inner: Box<dyn Iterator<Item = Result<Row, IngestError>> + 'a>,
    exhausted: bool,
}

impl Iterator for SheetRows<'_> {
    type Item = Result<Row, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let item = self.inner.next();
        if !matches!(item, Some(Ok(_))) {
            self.exhausted = true;
        }
        item
    }
}

/// Groups a stream of positioned cells into rows by absolute row index.
/// Row indices with no streamed cell come out as empty rows.
struct CellRows<F> {
    next_cell: F,
    pending: Option<PositionedCell>,
    next_row: u32,
    done: bool,
}

impl<F> CellRows<F>
where
    F: FnMut() -> Result<Option<PositionedCell>, IngestError>,
{
    fn new(next_cell: F) -> Self {
        CellRows {
            next_cell,
            pending: None,
            next_row: 0,
            done: false,
        }
    }

    fn pull(&mut self) -> Result<Option<PositionedCell>, IngestError> {
        let cell = (self.next_cell)();
        if !matches!(cell, Ok(Some(_))) {
            self.done = true;
        }
        cell
    }
}

impl<F> Iterator for CellRows<F>
where
    F: FnMut() -> Result<Option<PositionedCell>, IngestError>,
{
    type Item = Result<Row, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (row_index, column, value) = match self.pending.take() {
            Some(cell) => cell,
            None if self.done => return None,
            None => match self.pull() {
                Ok(Some(cell)) => cell,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            },
        };

        if self.next_row < row_index {
            self.next_row += 1;
            self.pending = Some((row_index, column, value));
            return Some(Ok(Row::new()));
        }
        self.next_row = row_index.saturating_add(1);

        let mut row = Row::new();
        place_cell(&mut row, column, value);

        while !self.done {
            match self.pull() {
                Ok(Some((cell_row, column, value))) if cell_row == row_index => {
                    place_cell(&mut row, column, value);
                }
                Ok(Some(cell)) => {
                    self.pending = Some(cell);
                    break;
                }
                Ok(None) => break,
                Err(e) => return Some(Err(e)),
            }
        }

        Some(Ok(row))
    }
}

fn place_cell(row: &mut Row, column: u32, value: Value) {
    let column = column as usize;
    if row.len() <= column {
        row.resize(column + 1, Value::Null);
    }
    row[column] = value;
}

/// Walks an already decoded range row by row. Rows above and columns left
/// of the range are padded so positions match the streamed formats.
struct RangeRows {
    range: Range<Data>,
    next_row: usize,
    row_offset: usize,
    column_offset: usize,
}

impl RangeRows {
    fn new(range: Range<Data>) -> Self {
        let (row_offset, column_offset) = range
            .start()
            .map_or((0, 0), |(row, column)| (row as usize, column as usize));
        RangeRows {
            range,
            next_row: 0,
            row_offset,
            column_offset,
        }
    }
}

impl Iterator for RangeRows {
    type Item = Result<Row, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (height, width) = self.range.get_size();
        if self.next_row < self.row_offset {
            self.next_row += 1;
            return Some(Ok(Row::new()));
        }

        let relative_row = self.next_row - self.row_offset;
        if relative_row >= height {
            return None;
        }

        let mut row = vec![Value::Null; self.column_offset];
        row.extend((0..width).map(|column| {
            self.range
                .get((relative_row, column))
                .map_or(Value::Null, data_to_json)
        }));
        self.next_row += 1;

        Some(Ok(row))
    }
}

//////////////////////////////////////////////////////////////
///  Cell conversion
//////////////////////////////////////////////////////////////

/// Convert a decoded cell to a JSON scalar
pub(crate) fn data_to_json(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Float(f) => float_to_json(*f),
        Data::Int(i) => Value::from(*i),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => datetime_to_json(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

/// Same as [`data_to_json`] for the borrowed cells of the streaming readers
fn data_ref_to_json(cell: &DataRef<'_>) -> Value {
    match cell {
        DataRef::Empty | DataRef::Error(_) => Value::Null,
        DataRef::String(s) => Value::String(s.clone()),
        DataRef::SharedString(s) => Value::String((*s).to_string()),
        DataRef::Float(f) => float_to_json(*f),
        DataRef::Int(i) => Value::from(*i),
        DataRef::Bool(b) => Value::Bool(*b),
        DataRef::DateTime(dt) => datetime_to_json(dt),
        DataRef::DateTimeIso(s) | DataRef::DurationIso(s) => Value::String(s.clone()),
    }
}

fn float_to_json(f: f64) -> Value {
    // Handle special float values
    if f.is_nan() || f.is_infinite() {
        return Value::Null;
    }

    // Whole numbers are stored as floats in the sheet; emit them as integers
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

/// The conversion honours the workbook's 1900 or 1904 date system
fn datetime_to_json(dt: &ExcelDateTime) -> Value {
    let text = if dt.is_duration() {
        dt.as_duration().map(format_cell_duration)
    } else {
        dt.as_datetime().map(format_cell_datetime)
    };
    text.map_or(Value::Null, Value::String)
}
