//! Structure analysis for lightweight sheet previews.
//!
//! [`analyze`] treats the whole grid as a single table (no segmentation): leading blank rows are
//! skipped, the first remaining row is promoted to a header by the same rule the segmenter uses,
//! and every column gets a [`ColumnType`] and a missing-value count.

use std::collections::HashSet;

use crate::types::{ColumnProfile, ColumnType, Grid, StructureReport, Value};

use super::normalize::{is_blank_row, is_missing};
use super::segment::resolve_columns;

/// Options for [`analyze_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeOptions {
    /// A text column is [`ColumnType::Categorical`] when `distinct / data_rows` is at or below this
    /// ratio, otherwise [`ColumnType::Mixed`].
    pub categorical_ratio: f64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            categorical_ratio: 0.5,
        }
    }
}

/// Analyze `grid` with default options.
pub fn analyze(grid: &Grid) -> StructureReport {
    analyze_with(grid, &AnalyzeOptions::default())
}

/// Build a [`StructureReport`] for `grid`.
///
/// Never fails. Type priority per column: numeric, then datetime, then categorical text, then
/// mixed. A column without any non-missing value is reported as numeric.
pub fn analyze_with(grid: &Grid, options: &AnalyzeOptions) -> StructureReport {
    let first = grid
        .rows()
        .iter()
        .position(|row| !is_blank_row(row))
        .unwrap_or(grid.row_count());
    let rows = &grid.rows()[first..];

    let width = grid.column_count();
    let (columns, header_promoted) = resolve_columns(rows.first().map(Vec::as_slice), width);
    let body = if header_promoted { &rows[1..] } else { rows };

    let profiles = columns
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells = body.iter().filter_map(|row| row.get(idx));
            let missing = cells.clone().filter(|c| is_missing(c)).count();
            let column_type = infer_column_type(cells, body.len(), options.categorical_ratio);
            ColumnProfile {
                name,
                column_type,
                missing,
            }
        })
        .collect();

    StructureReport {
        profiles,
        rows_count: body.len(),
        columns_count: width,
        has_data: !body.is_empty(),
        error: None,
    }
}

fn infer_column_type<'a>(
    cells: impl Iterator<Item = &'a Value> + Clone,
    row_count: usize,
    categorical_ratio: f64,
) -> ColumnType {
    let mut present = cells.filter(|c| !is_missing(c));

    if present.clone().all(Value::is_numeric) {
        return ColumnType::Numeric;
    }
    if present.clone().all(Value::is_temporal) {
        return ColumnType::Datetime;
    }

    let mut distinct: HashSet<&str> = HashSet::new();
    let all_text = present.all(|c| match c.as_str() {
        Some(s) => {
            distinct.insert(s);
            true
        }
        None => false,
    });
    if all_text && row_count > 0 && (distinct.len() as f64 / row_count as f64) <= categorical_ratio {
        ColumnType::Categorical
    } else {
        ColumnType::Mixed
    }
}
