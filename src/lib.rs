//! `sheet-tables` turns spreadsheet bytes into normalized, structured tables.
//!
//! Real-world sheets rarely hold exactly one table. They stack several logical tables separated by
//! blank rows, with inconsistent headers and mixed-type columns. This crate loads a sheet into a
//! rectangular [`types::Grid`], splits it at blank rows, decides per table whether the first row is
//! a header, and canonicalizes every cell so the output serializes cleanly.
//!
//! ## What you can read
//!
//! Workbook formats are auto-detected from the bytes: `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`.
//!
//! Cells become [`types::Value`]s. In output records (canonical form) values are one of:
//!
//! - [`types::Value::Null`] for empty cells, empty strings and NaN
//! - [`types::Value::Int64`] / [`types::Value::Float64`]
//! - [`types::Value::Bool`]
//! - [`types::Value::Utf8`], which also carries dates as ISO-8601 text (`2024-01-05`,
//!   `2024-01-05T10:30:00`)
//!
//! ## Quick example: every table in every sheet
//!
//! ```no_run
//! use sheet_tables::ingestion::{process, ProcessOptions};
//!
//! # fn main() -> Result<(), sheet_tables::SheetError> {
//! let bytes = std::fs::read("workbook.xlsx")?;
//! for sheet in process(&bytes, None, &ProcessOptions::default())? {
//!     if let Some(err) = &sheet.error {
//!         eprintln!("{}: {err}", sheet.sheet_name);
//!         continue;
//!     }
//!     for table in &sheet.tables {
//!         println!(
//!             "{} table {} rows {}..{} columns={:?}",
//!             sheet.sheet_name, table.table_index, table.start_row, table.end_row, table.columns
//!         );
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Working on an in-memory grid
//!
//! ```rust
//! use sheet_tables::processing::segment;
//! use sheet_tables::types::{Grid, Value};
//!
//! let grid = Grid::new(vec![
//!     vec![Value::from("a"), Value::from("b")],
//!     vec![Value::Int64(1), Value::Int64(2)],
//!     vec![Value::Int64(3), Value::Int64(4)],
//! ]);
//!
//! let tables = segment(&grid, "Sheet1");
//! assert_eq!(tables.len(), 1);
//! assert_eq!(tables[0].columns, vec!["a", "b"]);
//! assert_eq!(tables[0].data[0].get("a"), Some(&Value::Int64(1)));
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: workbook loading and the per-sheet orchestration entry points
//! - [`processing`]: normalization, structure analysis and segmentation over a grid
//! - [`types`]: grid, value, record, report and segment types
//! - [`error`]: error types used across loading

pub mod error;
pub mod ingestion;
pub mod processing;
pub mod types;

pub use error::{SheetError, SheetResult};
