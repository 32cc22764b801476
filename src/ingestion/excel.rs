//! Workbook loading: bytes → sheet names → [`Grid`].
//!
//! Formats are auto-detected by `calamine` (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`). The loader
//! never picks a sheet on its own; callers pass a [`SheetSelector`].

use std::fmt;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Range, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{SheetError, SheetResult};
use crate::types::{Grid, Value};

/// Which sheet to load: by name, or by zero-based position in workbook order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SheetSelector {
    Name(String),
    Index(usize),
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Name(name) => f.write_str(name),
            SheetSelector::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl From<String> for SheetSelector {
    fn from(name: String) -> Self {
        SheetSelector::Name(name)
    }
}

impl From<usize> for SheetSelector {
    fn from(idx: usize) -> Self {
        SheetSelector::Index(idx)
    }
}

/// Options controlling how raw cells become [`Value`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOptions {
    /// Read whole-number floats (how xlsx stores every number) as [`Value::Int64`].
    pub integral_floats_as_int: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            integral_floats_as_int: true,
        }
    }
}

/// An opened, fully buffered workbook.
pub struct Workbook {
    sheets: Sheets<Cursor<Vec<u8>>>,
    names: Vec<String>,
}

impl fmt::Debug for Workbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workbook").field("sheets", &self.names).finish()
    }
}

impl Workbook {
    /// Parse `bytes` as a workbook.
    ///
    /// Fails with [`SheetError::UnreadableWorkbook`] if no supported format accepts the buffer.
    pub fn open(bytes: impl Into<Vec<u8>>) -> SheetResult<Self> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes.into()))
            .map_err(|source| SheetError::UnreadableWorkbook { source })?;
        let names = sheets.sheet_names().to_vec();
        Ok(Self { sheets, names })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> &[String] {
        &self.names
    }

    /// Resolve a selector to an existing sheet name.
    pub fn resolve(&self, selector: &SheetSelector) -> SheetResult<String> {
        match selector {
            SheetSelector::Name(name) => {
                if self.names.iter().any(|n| n == name) {
                    Ok(name.clone())
                } else {
                    Err(SheetError::SheetNotFound {
                        name: name.clone(),
                        available: self.names.clone(),
                    })
                }
            }
            SheetSelector::Index(index) => {
                self.names
                    .get(*index)
                    .cloned()
                    .ok_or(SheetError::SheetIndexOutOfRange {
                        index: *index,
                        sheet_count: self.names.len(),
                    })
            }
        }
    }

    /// Materialize the selected sheet as a grid.
    pub fn grid(&mut self, selector: &SheetSelector, options: &GridOptions) -> SheetResult<Grid> {
        let name = self.resolve(selector)?;
        self.sheet_grid(&name, options)
    }

    /// Materialize a sheet known to exist (see [`Workbook::sheet_names`]).
    pub fn sheet_grid(&mut self, name: &str, options: &GridOptions) -> SheetResult<Grid> {
        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|source| SheetError::WorksheetRead {
                sheet: name.to_string(),
                source,
            })?;
        Ok(range_to_grid(&range, options))
    }
}

/// Open `bytes` and load one sheet.
pub fn load(bytes: &[u8], selector: &SheetSelector, options: &GridOptions) -> SheetResult<Grid> {
    Workbook::open(bytes)?.grid(selector, options)
}

/// Open `bytes` and list its sheet names.
pub fn sheet_names(bytes: &[u8]) -> SheetResult<Vec<String>> {
    Ok(Workbook::open(bytes)?.names)
}

/// Rows above the used range are kept as blank rows so grid row indices match the sheet.
/// Columns start at the first used column.
fn range_to_grid(range: &Range<Data>, options: &GridOptions) -> Grid {
    let leading = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let width = range.width();

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(leading + range.height());
    rows.extend(std::iter::repeat_with(|| vec![Value::Null; width]).take(leading));
    for row in range.rows() {
        rows.push(row.iter().map(|c| convert_cell(c, options)).collect());
    }
    Grid::new(rows)
}

fn convert_cell(c: &Data, options: &GridOptions) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Utf8(s.clone()),
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => float_value(*f, options),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => excel_datetime_value(dt),
        Data::DateTimeIso(s) => parse_iso_datetime(s).unwrap_or_else(|| Value::Utf8(s.clone())),
        Data::DurationIso(s) => Value::Utf8(s.clone()),
        Data::Error(e) => Value::Utf8(e.to_string()),
    }
}

// Beyond 2^53 not every integer is representable, so the float is kept as is.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn float_value(f: f64, options: &GridOptions) -> Value {
    if options.integral_floats_as_int && f.fract() == 0.0 && f.abs() <= MAX_EXACT_INT {
        Value::Int64(f as i64)
    } else {
        Value::Float64(f)
    }
}

fn excel_datetime_value(dt: &ExcelDateTime) -> Value {
    if dt.is_duration() {
        return Value::Utf8(duration_text(dt));
    }
    match dt.as_datetime() {
        Some(ndt) if is_midnight(ndt.time()) => Value::Date(ndt.date()),
        Some(ndt) => Value::DateTime(ndt),
        None => Value::Float64(dt.as_f64()),
    }
}

fn duration_text(dt: &ExcelDateTime) -> String {
    let Some(duration) = dt.as_duration() else {
        return dt.as_f64().to_string();
    };
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let secs = total.abs();
    format!(
        "{sign}{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Serial date-times carry no date/date-time distinction; midnight is read as a plain date.
fn is_midnight(time: NaiveTime) -> bool {
    time == NaiveTime::MIN
}

/// ISO text cells (ODS stores dates this way) become dates where they parse.
///
/// The text says which kind it is: `2023-07-14` is a date, `2023-07-14T00:00:00` a date-time.
fn parse_iso_datetime(s: &str) -> Option<Value> {
    let raw = s.trim().trim_end_matches('Z');
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Value::Date(d));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(Value::DateTime)
}
