//! Workbook-level entry points.
//!
//! These functions take a fully buffered workbook, load the selected sheet(s) through
//! [`super::excel::Workbook`], and run the analyzer and/or segmenter on each grid.
//!
//! - [`process`]: analyze and segment one sheet or every sheet; per-sheet failures are isolated
//! - [`read_sheet`]: flat records for one sheet, falling back to segmentation when empty
//! - [`analyze_sheet`]: structure report for one sheet (never fails)
//! - [`split_tables`]: segments for one sheet or every sheet (never fails)
//! - [`process_path`]: [`process`] for a file on disk
//!
//! If an [`super::observability::SheetObserver`] is configured, every sheet outcome is reported
//! to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{SheetError, SheetResult};
use crate::processing::segment::tabulate;
use crate::processing::{analyze_with, is_blank_row, segment, AnalyzeOptions};
use crate::types::{Grid, Record, StructureReport, TableSegment};

use super::excel::{GridOptions, SheetSelector, Workbook};
use super::observability::{SheetContext, SheetObserver, SheetOperation, SheetSeverity, SheetStats};

/// Supported workbook formats, as recognized from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Office Open XML workbook.
    Xlsx,
    /// Macro-enabled Office Open XML workbook.
    Xlsm,
    /// Binary workbook.
    Xlsb,
    /// Legacy BIFF workbook.
    Xls,
    /// OpenDocument spreadsheet.
    Ods,
}

impl WorkbookFormat {
    /// Parse a workbook format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xlsm" => Some(Self::Xlsm),
            "xlsb" => Some(Self::Xlsb),
            "xls" => Some(Self::Xls),
            "ods" => Some(Self::Ods),
            _ => None,
        }
    }
}

/// Reject uploads whose name does not end in a workbook extension.
pub fn ensure_supported_filename(name: &str) -> SheetResult<WorkbookFormat> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(WorkbookFormat::from_extension)
        .ok_or_else(|| SheetError::UnsupportedFormat {
            name: name.to_string(),
        })
}

/// What to do when a sheet name does not exist in the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetFallback {
    /// Fail with [`SheetError::SheetNotFound`] (default).
    #[default]
    Strict,
    /// Silently use the first sheet instead.
    FirstSheet,
}

/// Options controlling workbook processing.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ProcessOptions {
    /// Label for the input in observer events (file name, upload id, ...).
    pub source: String,
    /// Cell conversion options.
    pub grid: GridOptions,
    /// Structure analysis options.
    pub analyze: AnalyzeOptions,
    /// Behavior for unknown sheet names.
    pub sheet_fallback: SheetFallback,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn SheetObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: SheetSeverity,
}

impl fmt::Debug for ProcessOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessOptions")
            .field("source", &self.source)
            .field("grid", &self.grid)
            .field("analyze", &self.analyze)
            .field("sheet_fallback", &self.sheet_fallback)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            source: "<memory>".to_string(),
            grid: GridOptions::default(),
            analyze: AnalyzeOptions::default(),
            sheet_fallback: SheetFallback::default(),
            observer: None,
            alert_at_or_above: SheetSeverity::Critical,
        }
    }
}

impl ProcessOptions {
    fn context(&self, operation: SheetOperation, sheet: Option<&str>) -> SheetContext {
        SheetContext {
            source: self.source.clone(),
            sheet: sheet.map(str::to_string),
            operation,
        }
    }

    fn report_success(&self, ctx: &SheetContext, stats: SheetStats) {
        if let Some(obs) = self.observer.as_ref() {
            obs.on_success(ctx, stats);
        }
    }

    fn report_failure(&self, ctx: &SheetContext, error: &SheetError) {
        if let Some(obs) = self.observer.as_ref() {
            let sev = SheetSeverity::of(error);
            obs.on_failure(ctx, sev, error);
            if sev >= self.alert_at_or_above {
                obs.on_alert(ctx, sev, error);
            }
        }
    }
}

/// Result of processing one sheet with [`process`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetOutcome {
    /// Why the sheet could not be loaded. `structure` and `tables` then carry the same error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sheet_name: String,
    pub structure: StructureReport,
    pub tables: Vec<TableSegment>,
}

impl SheetOutcome {
    fn failed(sheet_name: &str, error: &SheetError) -> Self {
        Self {
            error: Some(error.to_string()),
            sheet_name: sheet_name.to_string(),
            structure: StructureReport::failed(error),
            tables: vec![TableSegment::degenerate(sheet_name, error)],
        }
    }
}

/// Result of [`read_sheet`].
///
/// Exactly one of `data` (flat read succeeded) and `tables` (flat read was empty) is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRead {
    pub sheet_name: String,
    pub is_empty: bool,
    pub multiple_tables: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableSegment>>,
}

/// Analyze and segment one sheet (`selector`) or every sheet (`None`).
///
/// Only an unreadable workbook fails the whole call. A sheet that cannot be resolved or decoded
/// yields a [`SheetOutcome`] with `error` set, and the remaining sheets are still processed.
///
/// # Examples
///
/// ```no_run
/// use sheet_tables::ingestion::{process, ProcessOptions};
///
/// # fn main() -> Result<(), sheet_tables::SheetError> {
/// let bytes = std::fs::read("report.xlsx")?;
/// for sheet in process(&bytes, None, &ProcessOptions::default())? {
///     for table in &sheet.tables {
///         println!("{} #{}: {:?}", sheet.sheet_name, table.table_index, table.columns);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn process(
    bytes: &[u8],
    selector: Option<&SheetSelector>,
    options: &ProcessOptions,
) -> SheetResult<Vec<SheetOutcome>> {
    let op = SheetOperation::Process;
    let mut workbook = open_observed(bytes, op, options)?;

    let loaded: Vec<(String, SheetResult<Grid>)> = match selector {
        Some(sel) => vec![load_selected(&mut workbook, sel, options)],
        None => {
            let names = workbook.sheet_names().to_vec();
            names
                .into_iter()
                .map(|name| {
                    let grid = workbook.sheet_grid(&name, &options.grid);
                    (name, grid)
                })
                .collect()
        }
    };

    let outcomes = loaded
        .into_iter()
        .map(|(name, grid)| {
            let ctx = options.context(op, Some(name.as_str()));
            match grid {
                Ok(grid) => {
                    let structure = analyze_with(&grid, &options.analyze);
                    let tables = segment(&grid, &name);
                    options.report_success(&ctx, table_stats(&tables));
                    SheetOutcome {
                        error: None,
                        sheet_name: name,
                        structure,
                        tables,
                    }
                }
                Err(e) => {
                    options.report_failure(&ctx, &e);
                    SheetOutcome::failed(&name, &e)
                }
            }
        })
        .collect();

    Ok(outcomes)
}

/// Read one sheet as flat records.
///
/// The grid is read from its first non-blank row; that row becomes the header when every cell is
/// text. Interior blank rows are kept as all-null records. When the flat read produces no
/// records, the sheet is segmented instead and `tables` is returned.
pub fn read_sheet(
    bytes: &[u8],
    selector: &SheetSelector,
    options: &ProcessOptions,
) -> SheetResult<SheetRead> {
    with_sheet(bytes, selector, SheetOperation::Read, options, |name, grid| {
        let data = flat_records(grid);
        if !data.is_empty() {
            let stats = SheetStats {
                rows: data.len(),
                tables: 0,
            };
            let read = SheetRead {
                sheet_name: name.to_string(),
                is_empty: false,
                multiple_tables: false,
                data: Some(data),
                tables: None,
            };
            return (read, stats);
        }

        let tables = segment(grid, name);
        let stats = table_stats(&tables);
        let read = SheetRead {
            sheet_name: name.to_string(),
            is_empty: true,
            multiple_tables: true,
            data: None,
            tables: Some(tables),
        };
        (read, stats)
    })
}

/// Structure report for one sheet. Failures are returned as a report with `error` set.
pub fn analyze_sheet(bytes: &[u8], selector: &SheetSelector, options: &ProcessOptions) -> StructureReport {
    with_sheet(bytes, selector, SheetOperation::Analyze, options, |_, grid| {
        let report = analyze_with(grid, &options.analyze);
        let stats = SheetStats {
            rows: report.rows_count,
            tables: 0,
        };
        (report, stats)
    })
    .unwrap_or_else(StructureReport::failed)
}

/// Segments for one sheet (`selector`) or for every sheet in order (`None`).
///
/// Never fails: a sheet that cannot be read contributes a single degenerate segment (see
/// [`TableSegment::degenerate`]); an unreadable workbook yields one degenerate segment named
/// after the selector, or `*` when no selector was given.
pub fn split_tables(
    bytes: &[u8],
    selector: Option<&SheetSelector>,
    options: &ProcessOptions,
) -> Vec<TableSegment> {
    if let Some(sel) = selector {
        return with_sheet(bytes, sel, SheetOperation::Split, options, |name, grid| {
            let tables = segment(grid, name);
            let stats = table_stats(&tables);
            (tables, stats)
        })
        .unwrap_or_else(|e| vec![TableSegment::degenerate(sel.to_string(), e)]);
    }

    let op = SheetOperation::Split;
    let mut workbook = match open_observed(bytes, op, options) {
        Ok(wb) => wb,
        Err(e) => return vec![TableSegment::degenerate("*", e)],
    };

    let names = workbook.sheet_names().to_vec();
    let mut out = Vec::new();
    for name in names {
        let ctx = options.context(op, Some(name.as_str()));
        match workbook.sheet_grid(&name, &options.grid) {
            Ok(grid) => {
                let tables = segment(&grid, &name);
                options.report_success(&ctx, table_stats(&tables));
                out.extend(tables);
            }
            Err(e) => {
                options.report_failure(&ctx, &e);
                out.push(TableSegment::degenerate(name.as_str(), e));
            }
        }
    }
    out
}

/// Read a workbook file and [`process`] it.
///
/// The file name must carry a workbook extension (see [`ensure_supported_filename`]). The path
/// becomes the observer `source` label.
pub fn process_path(
    path: impl AsRef<Path>,
    selector: Option<&SheetSelector>,
    options: &ProcessOptions,
) -> SheetResult<Vec<SheetOutcome>> {
    let path = path.as_ref();
    let options = ProcessOptions {
        source: path.display().to_string(),
        ..options.clone()
    };
    let ctx = options.context(SheetOperation::Process, None);

    let bytes = ensure_supported_filename(&path.to_string_lossy())
        .and_then(|_| std::fs::read(path).map_err(SheetError::from));
    match bytes {
        Ok(bytes) => process(&bytes, selector, &options),
        Err(e) => {
            options.report_failure(&ctx, &e);
            Err(e)
        }
    }
}

fn open_observed(bytes: &[u8], op: SheetOperation, options: &ProcessOptions) -> SheetResult<Workbook> {
    Workbook::open(bytes).inspect_err(|e| {
        options.report_failure(&options.context(op, None), e);
    })
}

/// Resolve `selector` (honoring the fallback policy) and load its grid.
///
/// The returned label is the resolved sheet name, or the selector text if resolution failed.
fn load_selected(
    workbook: &mut Workbook,
    selector: &SheetSelector,
    options: &ProcessOptions,
) -> (String, SheetResult<Grid>) {
    let resolved = match (workbook.resolve(selector), options.sheet_fallback) {
        (Err(SheetError::SheetNotFound { .. }), SheetFallback::FirstSheet) => {
            workbook.resolve(&SheetSelector::Index(0))
        }
        (res, _) => res,
    };
    match resolved {
        Ok(name) => {
            let grid = workbook.sheet_grid(&name, &options.grid);
            (name, grid)
        }
        Err(e) => (selector.to_string(), Err(e)),
    }
}

/// Open the workbook, load one sheet, run `f` on it, and report the outcome.
fn with_sheet<T>(
    bytes: &[u8],
    selector: &SheetSelector,
    op: SheetOperation,
    options: &ProcessOptions,
    f: impl FnOnce(&str, &Grid) -> (T, SheetStats),
) -> SheetResult<T> {
    let mut workbook = open_observed(bytes, op, options)?;
    let (name, grid) = load_selected(&mut workbook, selector, options);
    let ctx = options.context(op, Some(name.as_str()));
    match grid {
        Ok(grid) => {
            let (out, stats) = f(&name, &grid);
            options.report_success(&ctx, stats);
            Ok(out)
        }
        Err(e) => {
            options.report_failure(&ctx, &e);
            Err(e)
        }
    }
}

fn flat_records(grid: &Grid) -> Vec<Record> {
    let first = grid
        .rows()
        .iter()
        .position(|row| !is_blank_row(row))
        .unwrap_or(grid.row_count());
    tabulate(&grid.rows()[first..], grid.column_count()).data
}

fn table_stats(tables: &[TableSegment]) -> SheetStats {
    SheetStats {
        rows: tables.iter().map(|t| t.rows_count).sum(),
        tables: tables.len(),
    }
}
