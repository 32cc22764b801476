use thiserror::Error;

/// Convenience result type for workbook and sheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Error type returned by loader and orchestrator functions.
///
/// Segmentation and analysis over an in-memory [`crate::types::Grid`] never fail; these errors only
/// come from turning bytes (or a path) into a grid.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Underlying I/O error (path-based entry points only).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte buffer is not a workbook in any supported format. Fatal for the whole request.
    #[error("unreadable workbook: {source}")]
    UnreadableWorkbook {
        #[source]
        source: calamine::Error,
    },

    /// An explicitly named sheet does not exist in the workbook.
    #[error("sheet '{name}' not found. sheets={available:?}")]
    SheetNotFound { name: String, available: Vec<String> },

    /// A positional sheet selector is past the last sheet.
    #[error("sheet index {index} out of range (workbook has {sheet_count} sheets)")]
    SheetIndexOutOfRange { index: usize, sheet_count: usize },

    /// The sheet exists but its cells could not be decoded.
    #[error("failed to read sheet '{sheet}': {source}")]
    WorksheetRead {
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    /// The file name does not carry a workbook extension.
    #[error("unsupported file '{name}': expected one of .xlsx, .xlsm, .xlsb, .xls, .ods")]
    UnsupportedFormat { name: String },
}
