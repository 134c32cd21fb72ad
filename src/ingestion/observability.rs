use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::error::IngestionError;

use super::unified::IngestionFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the file was skipped).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Context about one file of a directory load.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub path: PathBuf,
    pub format: IngestionFormat,
}

/// Stats reported for a successfully parsed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    pub rows: usize,
}

/// Stats reported when normalization discards rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowDropStats {
    /// Rows handed to the normalizer.
    pub input_rows: usize,
    /// Rows discarded for lacking a valid timestamp.
    pub dropped_rows: usize,
}

/// Observer interface for recoverable pipeline events.
///
/// Skipped files and dropped rows never abort a run; this is where they surface. Implementors can
/// record metrics, logs, or trigger alerts.
pub trait PipelineObserver: Send + Sync {
    /// Called when a file was parsed and its rows were added to the table.
    fn on_file_loaded(&self, _ctx: &FileContext, _stats: FileStats) {}

    /// Called when a file was skipped.
    fn on_file_skipped(&self, _ctx: &FileContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when a skipped file meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_file_skipped`].
    fn on_alert(&self, ctx: &FileContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_file_skipped(ctx, severity, error)
    }

    /// Called once per normalization run that dropped at least one row.
    fn on_rows_dropped(&self, _stats: RowDropStats) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
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

impl PipelineObserver for CompositeObserver {
    fn on_file_loaded(&self, ctx: &FileContext, stats: FileStats) {
        for o in &self.observers {
            o.on_file_loaded(ctx, stats);
        }
    }

    fn on_file_skipped(&self, ctx: &FileContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_file_skipped(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &FileContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_rows_dropped(&self, stats: RowDropStats) {
        for o in &self.observers {
            o.on_rows_dropped(stats);
        }
    }
}

/// Logs pipeline events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl PipelineObserver for StdErrObserver {
    fn on_file_loaded(&self, ctx: &FileContext, stats: FileStats) {
        eprintln!(
            "[load][ok] format={:?} path={} rows={}",
            ctx.format,
            ctx.path.display(),
            stats.rows
        );
    }

    fn on_file_skipped(&self, ctx: &FileContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!(
            "[load][{:?}] skipped format={:?} path={} err={}",
            severity,
            ctx.format,
            ctx.path.display(),
            error
        );
    }

    fn on_alert(&self, ctx: &FileContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!(
            "[ALERT][load][{:?}] format={:?} path={} err={}",
            severity,
            ctx.format,
            ctx.path.display(),
            error
        );
    }

    fn on_rows_dropped(&self, stats: RowDropStats) {
        eprintln!(
            "[normalize] dropped {} of {} rows without a valid timestamp",
            stats.dropped_rows, stats.input_rows
        );
    }
}

/// Appends pipeline events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
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

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_file_loaded(&self, ctx: &FileContext, stats: FileStats) {
        self.append_line(&format!(
            "{} loaded format={:?} path={} rows={}",
            unix_ts(),
            ctx.format,
            ctx.path.display(),
            stats.rows
        ));
    }

    fn on_file_skipped(&self, ctx: &FileContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} skipped severity={:?} format={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.path.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &FileContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} format={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.path.display(),
            error
        ));
    }

    fn on_rows_dropped(&self, stats: RowDropStats) {
        self.append_line(&format!(
            "{} dropped rows={} of={}",
            unix_ts(),
            stats.dropped_rows,
            stats.input_rows
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
