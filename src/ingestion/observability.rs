use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::SheetError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SheetSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the sheet could not be processed).
    Error,
    /// Critical error (the workbook itself is unusable, or I/O failed).
    Critical,
}

impl SheetSeverity {
    /// Severity of a failure, used to decide whether to alert.
    pub fn of(error: &SheetError) -> Self {
        match error {
            SheetError::Io(_) | SheetError::UnreadableWorkbook { .. } => SheetSeverity::Critical,
            SheetError::SheetNotFound { .. }
            | SheetError::SheetIndexOutOfRange { .. }
            | SheetError::WorksheetRead { .. }
            | SheetError::UnsupportedFormat { .. } => SheetSeverity::Error,
        }
    }
}

/// Which orchestrator entry point produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetOperation {
    Read,
    Analyze,
    Split,
    Process,
}

/// Context about one sheet-level (or workbook-level) operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetContext {
    /// Caller-supplied label for the input (file name, upload id, ...).
    pub source: String,
    /// Sheet name, or the selector text when the sheet was never resolved. `None` for
    /// workbook-level events.
    pub sheet: Option<String>,
    pub operation: SheetOperation,
}

/// Minimal stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SheetStats {
    /// Data rows produced (summed over tables when segmenting).
    pub rows: usize,
    /// Tables produced; `0` for flat reads and analysis.
    pub tables: usize,
}

/// Observer interface for sheet processing outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait SheetObserver: Send + Sync {
    /// Called when a sheet was processed.
    fn on_success(&self, _ctx: &SheetContext, _stats: SheetStats) {}

    /// Called when a sheet (or the whole workbook) failed.
    fn on_failure(&self, _ctx: &SheetContext, _severity: SheetSeverity, _error: &SheetError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &SheetContext, severity: SheetSeverity, error: &SheetError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn SheetObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn SheetObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl SheetObserver for CompositeObserver {
    fn on_success(&self, ctx: &SheetContext, stats: SheetStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &SheetContext, severity: SheetSeverity, error: &SheetError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &SheetContext, severity: SheetSeverity, error: &SheetError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl SheetObserver for StdErrObserver {
    fn on_success(&self, ctx: &SheetContext, stats: SheetStats) {
        eprintln!(
            "[sheets][ok] op={:?} source={} sheet={} rows={} tables={}",
            ctx.operation,
            ctx.source,
            sheet_label(ctx),
            stats.rows,
            stats.tables
        );
    }

    fn on_failure(&self, ctx: &SheetContext, severity: SheetSeverity, error: &SheetError) {
        eprintln!(
            "[sheets][{:?}] op={:?} source={} sheet={} err={}",
            severity,
            ctx.operation,
            ctx.source,
            sheet_label(ctx),
            error
        );
    }

    fn on_alert(&self, ctx: &SheetContext, severity: SheetSeverity, error: &SheetError) {
        eprintln!(
            "[ALERT][sheets][{:?}] op={:?} source={} sheet={} err={}",
            severity,
            ctx.operation,
            ctx.source,
            sheet_label(ctx),
            error
        );
    }
}

fn sheet_label(ctx: &SheetContext) -> &str {
    ctx.sheet.as_deref().unwrap_or("*")
}

/// Appends one JSON object per event to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

#[derive(Serialize)]
struct LogLine<'a> {
    ts: u64,
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<SheetSeverity>,
    #[serde(flatten)]
    ctx: &'a SheetContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<SheetStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append(&self, line: &LogLine<'_>) {
        let Ok(json) = serde_json::to_string(line) else {
            return;
        };
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{json}");
        }
    }

    fn append_failure(&self, event: &str, ctx: &SheetContext, severity: SheetSeverity, error: &SheetError) {
        self.append(&LogLine {
            ts: unix_ts(),
            event,
            severity: Some(severity),
            ctx,
            stats: None,
            error: Some(error.to_string()),
        });
    }
}

impl SheetObserver for FileObserver {
    fn on_success(&self, ctx: &SheetContext, stats: SheetStats) {
        self.append(&LogLine {
            ts: unix_ts(),
            event: "ok",
            severity: None,
            ctx,
            stats: Some(stats),
            error: None,
        });
    }

    fn on_failure(&self, ctx: &SheetContext, severity: SheetSeverity, error: &SheetError) {
        self.append_failure("fail", ctx, severity, error);
    }

    fn on_alert(&self, ctx: &SheetContext, severity: SheetSeverity, error: &SheetError) {
        self.append_failure("alert", ctx, severity, error);
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
