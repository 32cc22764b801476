//! Core data model types.
//!
//! A sheet is read into a rectangular [`Grid`] of raw [`Value`]s. Analysis produces a
//! [`StructureReport`]; segmentation produces [`TableSegment`]s whose rows are [`Record`]s of
//! canonical values.

use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::processing::normalize::to_iso8601;

/// A single cell value.
///
/// Raw grids may contain every variant. Canonical values (see
/// [`crate::processing::normalize::normalize`]) never contain `Date`/`DateTime` or a NaN float.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float. NaN is treated as a missing marker.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Calendar date without a time component.
    Date(NaiveDate),
    /// Date and time of day, no timezone.
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns the text payload for `Utf8` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// `true` for `Int64` and `Float64` (including NaN; check missing-ness first).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int64(_) | Value::Float64(_))
    }

    /// `true` for `Date` and `DateTime`.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::DateTime(_))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Float64(v) if v.is_nan() => serializer.serialize_none(),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Utf8(s) => serializer.serialize_str(s),
            Value::Date(_) | Value::DateTime(_) => {
                serializer.serialize_str(&to_iso8601(self).unwrap_or_default())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Rectangular array of raw cell values read from one sheet.
///
/// Every row has [`Grid::column_count`] cells; short rows are right-padded with [`Value::Null`]
/// when the grid is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    rows: Vec<Vec<Value>>,
    width: usize,
}

impl Grid {
    /// Build a grid, padding short rows to the widest row.
    pub fn new(mut rows: Vec<Vec<Value>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Value::Null);
        }
        Self { rows, width }
    }

    /// Number of rows, blank rows included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns shared by every row.
    pub fn column_count(&self) -> usize {
        self.width
    }

    /// `true` when the grid has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// A single row, if `idx` is in range.
    pub fn row(&self, idx: usize) -> Option<&[Value]> {
        self.rows.get(idx).map(Vec::as_slice)
    }
}

/// One output row: column name → canonical value, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create a record from ordered `(column, value)` pairs.
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    /// Value of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(k, v)| (k, v)))
    }
}

/// Inferred type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Every non-missing value is a number.
    Numeric,
    /// Every non-missing value is a date or date-time.
    Datetime,
    /// Text with few distinct values relative to the row count.
    Categorical,
    /// Anything else.
    Mixed,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Datetime => "datetime",
            ColumnType::Categorical => "categorical",
            ColumnType::Mixed => "mixed",
        }
    }
}

/// Per-column summary produced by the structure analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnProfile {
    /// Header text, or a synthetic `Column N` name.
    pub name: String,
    pub column_type: ColumnType,
    /// Rows whose cell is a missing marker.
    pub missing: usize,
}

/// Lightweight structural preview of one sheet.
///
/// Serializes as `{columns, rows_count, columns_count, dtypes, has_data, missing_values, error?}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureReport {
    pub profiles: Vec<ColumnProfile>,
    /// Data rows (a promoted header row is not counted).
    pub rows_count: usize,
    pub columns_count: usize,
    pub has_data: bool,
    /// Set when the sheet could not be read; every other field is then empty.
    pub error: Option<String>,
}

impl StructureReport {
    /// Report for a sheet that could not be read.
    pub fn failed(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    /// Column names in order.
    pub fn columns(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    /// Profile of `column`, if present.
    pub fn profile(&self, column: &str) -> Option<&ColumnProfile> {
        self.profiles.iter().find(|p| p.name == column)
    }
}

impl Serialize for StructureReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Dtypes<'a>(&'a [ColumnProfile]);
        impl Serialize for Dtypes<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_map(self.0.iter().map(|p| (&p.name, p.column_type)))
            }
        }

        struct Missing<'a>(&'a [ColumnProfile]);
        impl Serialize for Missing<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_map(self.0.iter().map(|p| (&p.name, p.missing)))
            }
        }

        let len = if self.error.is_some() { 7 } else { 6 };
        let mut s = serializer.serialize_struct("StructureReport", len)?;
        if let Some(err) = &self.error {
            s.serialize_field("error", err)?;
        }
        s.serialize_field("columns", &self.columns())?;
        s.serialize_field("rows_count", &self.rows_count)?;
        s.serialize_field("columns_count", &self.columns_count)?;
        s.serialize_field("dtypes", &Dtypes(&self.profiles))?;
        s.serialize_field("has_data", &self.has_data)?;
        s.serialize_field("missing_values", &Missing(&self.profiles))?;
        s.end()
    }
}

/// A contiguous, non-blank row range of a sheet treated as one logical table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSegment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sheet_name: String,
    /// Zero-based position among the segments emitted for this sheet.
    pub table_index: usize,
    /// First grid row of the range (the header row when `header_promoted`), inclusive.
    pub start_row: usize,
    /// Grid row after the last data row, exclusive.
    pub end_row: usize,
    pub columns: Vec<String>,
    /// Data rows, excluding a promoted header.
    pub rows_count: usize,
    pub header_promoted: bool,
    pub data: Vec<Record>,
}

impl TableSegment {
    /// An error-carrying placeholder used when a sheet could not be read at all.
    ///
    /// Callers must check [`TableSegment::is_degenerate`] rather than treat it as an empty table.
    pub fn degenerate(sheet_name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            sheet_name: sheet_name.into(),
            table_index: 0,
            start_row: 0,
            end_row: 0,
            columns: Vec::new(),
            rows_count: 0,
            header_promoted: false,
            data: Vec::new(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.error.is_some()
    }

    /// Absolute grid row of the promoted header, if any.
    pub fn header_row(&self) -> Option<usize> {
        self.header_promoted.then_some(self.start_row)
    }
}
