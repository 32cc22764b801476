//! In-memory transformations over a [`crate::types::Grid`].
//!
//! Everything here is pure and infallible: grids are read, never edited, and every result is a
//! fresh value.
//!
//! - [`normalize()`]: canonicalize one cell value (missing → null, dates → ISO-8601 text)
//! - [`analyze()`]: structural preview (column names, inferred types, missing counts)
//! - [`segment()`]: split a grid into the tables it contains, separated by blank rows
//!
//! ## Example: analyze then segment
//!
//! ```rust
//! use sheet_tables::processing::{analyze, segment};
//! use sheet_tables::types::{ColumnType, Grid, Value};
//!
//! let grid = Grid::new(vec![
//!     vec![Value::from("a"), Value::from("b")],
//!     vec![Value::Int64(1), Value::Int64(2)],
//!     vec![Value::Int64(3), Value::Int64(4)],
//! ]);
//!
//! let report = analyze(&grid);
//! assert_eq!(report.columns(), vec!["a", "b"]);
//! assert_eq!(report.profiles[0].column_type, ColumnType::Numeric);
//!
//! let tables = segment(&grid, "Sheet1");
//! assert_eq!(tables.len(), 1);
//! assert_eq!(tables[0].rows_count, 2);
//! assert_eq!(tables[0].data[1].get("b"), Some(&Value::Int64(4)));
//! ```

pub mod analyze;
pub mod normalize;
pub mod segment;

pub use analyze::{analyze, analyze_with, AnalyzeOptions};
pub use normalize::{is_blank_row, is_missing, normalize, to_iso8601};
pub use segment::segment;
