//! Workbook ingestion: bytes → sheets → grids → tables.
//!
//! Most callers should use [`process`] (from [`unified`]) which:
//!
//! - opens a fully buffered workbook and loads one or every sheet
//! - analyzes and segments each sheet, isolating per-sheet failures
//! - optionally reports success/failure/alerts to a [`SheetObserver`]
//!
//! The single-purpose entry points [`read_sheet`], [`analyze_sheet`] and [`split_tables`] are
//! also available, and [`excel`] exposes the grid loader directly.

pub mod excel;
pub mod observability;
pub mod unified;

pub use excel::{load, sheet_names, GridOptions, SheetSelector, Workbook};
pub use observability::{
    CompositeObserver, FileObserver, SheetContext, SheetObserver, SheetOperation, SheetSeverity, SheetStats,
    StdErrObserver,
};
pub use unified::{
    analyze_sheet, ensure_supported_filename, process, process_path, read_sheet, split_tables, ProcessOptions,
    SheetFallback, SheetOutcome, SheetRead, WorkbookFormat,
};
