//! Blank-row table segmentation.
//!
//! A sheet often holds several logical tables stacked vertically, separated by one or more blank
//! rows. [`segment`] splits a [`Grid`] at those rows, decides per segment whether the first row is
//! a header, and normalizes every data cell.
//!
//! Header promotion is syntactic: the first row of a segment is the header iff every cell in it is
//! non-missing text. An all-text data row is therefore indistinguishable from a header.
//!
//! ```rust
//! use sheet_tables::processing::segment;
//! use sheet_tables::types::{Grid, Value};
//!
//! let grid = Grid::new(vec![
//!     vec![Value::from("x"), Value::from("y")],
//!     vec![Value::Int64(1), Value::Int64(2)],
//!     vec![Value::Null, Value::Null],
//!     vec![Value::from("p"), Value::from("q")],
//!     vec![Value::Int64(5), Value::Int64(6)],
//! ]);
//!
//! let tables = segment(&grid, "Sheet1");
//! assert_eq!(tables.len(), 2);
//! assert_eq!((tables[1].start_row, tables[1].end_row), (3, 5));
//! assert_eq!(tables[1].columns, vec!["p", "q"]);
//! assert_eq!(tables[1].data[0].get("q"), Some(&Value::Int64(6)));
//! ```

use std::collections::HashSet;
use std::ops::Range;

use crate::types::{Grid, Record, TableSegment, Value};

use super::normalize::{is_blank_row, normalize};

/// Split `grid` into tables separated by blank rows.
///
/// Returns segments in row order with dense `table_index` values starting at 0. Skipped runs
/// (such as the empty run before a leading blank row) do not consume an index, so a sheet that
/// starts with blank rows still numbers its first table 0. An empty or entirely blank grid
/// yields no segments.
pub fn segment(grid: &Grid, sheet_name: &str) -> Vec<TableSegment> {
    if grid.is_empty() {
        return Vec::new();
    }

    let breaks = find_breaks(grid);
    let mut tables = Vec::new();
    for range in candidate_ranges(&breaks, grid.row_count()) {
        if range.start >= range.end {
            continue;
        }
        let rows = &grid.rows()[range.clone()];
        // Cannot happen for ranges built from break positions; guards the grid edges.
        if rows.first().is_none_or(|r| is_blank_row(r)) {
            continue;
        }

        let table = tabulate(rows, grid.column_count());
        tables.push(TableSegment {
            error: None,
            sheet_name: sheet_name.to_string(),
            table_index: tables.len(),
            start_row: range.start,
            end_row: range.end,
            columns: table.columns,
            rows_count: table.data.len(),
            header_promoted: table.header_promoted,
            data: table.data,
        });
    }
    tables
}

/// Indices of blank rows, in ascending order.
pub fn find_breaks(grid: &Grid) -> Vec<usize> {
    grid.rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| is_blank_row(row))
        .map(|(idx, _)| idx)
        .collect()
}

/// Row ranges between consecutive breaks, before empty ranges are discarded.
///
/// `breaks` must be sorted and below `row_count`. Ranges may be empty (`start >= end`) where
/// breaks are adjacent or sit at the grid edges.
pub fn candidate_ranges(breaks: &[usize], row_count: usize) -> Vec<Range<usize>> {
    let Some((&first, _)) = breaks.split_first() else {
        return vec![0..row_count];
    };

    let mut ranges = Vec::with_capacity(breaks.len() + 1);
    ranges.push(0..first);
    for pair in breaks.windows(2) {
        ranges.push(pair[0] + 1..pair[1]);
    }
    if let Some(&last) = breaks.last() {
        ranges.push(last + 1..row_count);
    }
    ranges
}

/// `true` if `row` qualifies as a header: non-empty and every cell is text.
pub fn is_header_row(row: &[Value]) -> bool {
    !row.is_empty() && row.iter().all(|c| matches!(c, Value::Utf8(_)))
}

/// Positional column names: `Column 1`, `Column 2`, ...
pub fn synthetic_columns(width: usize) -> Vec<String> {
    (1..=width).map(|i| format!("Column {i}")).collect()
}

/// Column names plus normalized data rows for one run of rows.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Table {
    pub(crate) columns: Vec<String>,
    pub(crate) header_promoted: bool,
    pub(crate) data: Vec<Record>,
}

/// Resolve columns for `rows` (promoting the first row when it is a header) and build records.
pub(crate) fn tabulate(rows: &[Vec<Value>], width: usize) -> Table {
    let (columns, header_promoted) = resolve_columns(rows.first().map(Vec::as_slice), width);
    let body = if header_promoted { &rows[1..] } else { rows };
    let data = body.iter().map(|row| to_record(&columns, row)).collect();
    Table {
        columns,
        header_promoted,
        data,
    }
}

/// Header names from `first_row` when it qualifies, otherwise synthetic names.
pub(crate) fn resolve_columns(first_row: Option<&[Value]>, width: usize) -> (Vec<String>, bool) {
    match first_row {
        Some(row) if is_header_row(row) => {
            let names = row
                .iter()
                .map(|c| c.as_str().unwrap_or_default().to_string())
                .collect();
            (dedupe_columns(names), true)
        }
        _ => (synthetic_columns(width), false),
    }
}

/// Make names unique by suffixing repeats: `a`, `a.1`, `a.2`.
///
/// A suffix never takes a name that appears anywhere in the header row, so a literal `a.1`
/// header keeps its name.
fn dedupe_columns(names: Vec<String>) -> Vec<String> {
    let reserved: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut n = 1;
        while seen.contains(&candidate) || (candidate != name && reserved.contains(&candidate)) {
            candidate = format!("{name}.{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

fn to_record(columns: &[String], row: &[Value]) -> Record {
    Record::new(
        columns
            .iter()
            .zip(row.iter())
            .map(|(name, cell)| (name.clone(), normalize(cell)))
            .collect(),
    )
}
