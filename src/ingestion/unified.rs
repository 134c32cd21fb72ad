//! Directory loading: the raw record ingestor.
//!
//! Most callers should use [`load`] or [`load_with_options`], which read every supported file in a
//! directory into one [`UnifiedTable`].
//!
//! - Files are visited in file-name order; rows keep their order within each file.
//! - The format of each file is inferred from its extension unless [`LoadOptions::format`] forces
//!   one.
//! - A file that cannot be ingested is skipped, logged, reported to the
//!   [`PipelineObserver`] (if any), and recorded in [`crate::types::LoadReport::skipped`]. It
//!   never aborts the load.
//! - No files, a missing directory, or no readable files produce an empty table, not an error.

use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use walkdir::WalkDir;

use crate::config::OdColumns;
use crate::error::{IngestionError, IngestionResult};
use crate::execution::{ExecutionEngine, ExecutionOptions};
use crate::types::{LoadedFile, RawRecord, SkippedFile, UnifiedTable};

use super::observability::{FileContext, FileStats, IngestionSeverity, PipelineObserver};
use super::{csv, json, parquet};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
    /// Apache Parquet.
    Parquet,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Options controlling directory loading.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct LoadOptions {
    /// Expected OD header names.
    pub columns: OdColumns,
    /// If `None`, infer the format of each file from its extension and ignore files with an
    /// unknown extension. If set, every file (after `file_pattern`) is parsed with this format.
    pub format: Option<IngestionFormat>,
    /// Only consider files whose name matches this glob.
    pub file_pattern: Option<glob::Pattern>,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Parse files in parallel on a rayon pool when set.
    pub execution: Option<ExecutionOptions>,
    /// Optional observer for skipped/loaded files.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("columns", &self.columns)
            .field("format", &self.format)
            .field("file_pattern", &self.file_pattern.as_ref().map(|p| p.as_str()))
            .field("recursive", &self.recursive)
            .field("execution", &self.execution)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            columns: OdColumns::default(),
            format: None,
            file_pattern: None,
            recursive: false,
            execution: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Load every supported file in `directory` using default options.
pub fn load(directory: impl AsRef<Path>) -> UnifiedTable {
    load_with_options(directory, &LoadOptions::default())
}

/// Load every candidate file in `directory` into one [`UnifiedTable`].
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use ridership_processing::config::OdColumns;
/// use ridership_processing::ingestion::{load_with_options, LoadOptions, StdErrObserver};
///
/// let opts = LoadOptions {
///     columns: OdColumns::taipei_metro(),
///     file_pattern: Some(glob::Pattern::new("*.csv").unwrap()),
///     observer: Some(Arc::new(StdErrObserver::default())),
///     ..Default::default()
/// };
/// let table = load_with_options("data/raw", &opts);
/// if table.is_empty() {
///     eprintln!("nothing to aggregate");
/// }
/// ```
pub fn load_with_options(directory: impl AsRef<Path>, options: &LoadOptions) -> UnifiedTable {
    match &options.execution {
        Some(exec) => ExecutionEngine::new(exec.clone()).load_dir(directory, options),
        None => {
            let files = discover_files(directory.as_ref(), options);
            let results = files
                .iter()
                .map(|(path, fmt)| ingest_file(path, &options.columns, Some(*fmt)))
                .collect();
            assemble(files, results, options)
        }
    }
}

/// Ingest a single file.
///
/// If `format` is `None`, the format is inferred from the file extension.
pub fn ingest_file(
    path: impl AsRef<Path>,
    columns: &OdColumns,
    format: Option<IngestionFormat>,
) -> IngestionResult<Vec<RawRecord>> {
    let path = path.as_ref();
    let fmt = match format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path, columns),
        IngestionFormat::Json => json::ingest_json_from_path(path, columns),
        IngestionFormat::Parquet => parquet::ingest_parquet_from_path(path, columns),
    }
}

/// List candidate files under `directory`, sorted by file name.
///
/// Symlinks are followed, so a linked file counts like the file it points to. A missing or
/// unreadable directory yields no files (logged as a warning).
pub fn discover_files(directory: &Path, options: &LoadOptions) -> Vec<(PathBuf, IngestionFormat)> {
    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut out = Vec::new();

    for entry in WalkDir::new(directory)
        .follow_links(true)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(dir = %directory.display(), error = %err, "cannot read directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if let Some(pattern) = &options.file_pattern {
            if !pattern.matches(&name) {
                continue;
            }
        }

        let fmt = match options.format {
            Some(f) => f,
            None => match entry.path().extension().and_then(|e| e.to_str()) {
                Some(ext) => match IngestionFormat::from_extension(ext) {
                    Some(f) => f,
                    None => continue,
                },
                None => continue,
            },
        };
        out.push((entry.into_path(), fmt));
    }

    out
}

/// Concatenate per-file results in file order, reporting every skipped file.
pub(crate) fn assemble(
    files: Vec<(PathBuf, IngestionFormat)>,
    results: Vec<IngestionResult<Vec<RawRecord>>>,
    options: &LoadOptions,
) -> UnifiedTable {
    let mut table = UnifiedTable::default();
    if files.is_empty() {
        tracing::warn!("no input files found");
        return table;
    }

    for ((path, format), result) in files.into_iter().zip(results) {
        let ctx = FileContext { path, format };
        match result {
            Ok(mut rows) => {
                if let Some(obs) = options.observer.as_ref() {
                    obs.on_file_loaded(&ctx, FileStats { rows: rows.len() });
                }
                tracing::debug!(path = %ctx.path.display(), rows = rows.len(), "file loaded");
                table.report.loaded.push(LoadedFile {
                    path: ctx.path,
                    format,
                    rows: rows.len(),
                });
                table.records.append(&mut rows);
            }
            Err(e) => {
                let sev = severity_for_error(&e);
                tracing::warn!(path = %ctx.path.display(), severity = ?sev, error = %e, "skipping file");
                if let Some(obs) = options.observer.as_ref() {
                    obs.on_file_skipped(&ctx, sev, &e);
                    if sev >= options.alert_at_or_above {
                        obs.on_alert(&ctx, sev, &e);
                    }
                }
                table.report.skipped.push(SkippedFile {
                    path: ctx.path,
                    severity: sev,
                    error: e.to_string(),
                });
            }
        }
    }

    if table.report.loaded.is_empty() {
        tracing::warn!(skipped = table.report.skipped.len(), "no file could be ingested");
    } else {
        tracing::info!(
            files = table.report.loaded.len(),
            skipped = table.report.skipped.len(),
            rows = table.records.len(),
            "merged input files"
        );
    }
    table
}

/// Classify an ingestion failure: infrastructure (I/O) problems are `Critical`, content problems
/// are `Error`.
pub fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::Parquet(err) => {
            // Parquet errors often wrap IO, but not always in a structured way.
            if error_chain_contains_io(err) {
                IngestionSeverity::Critical
            } else {
                IngestionSeverity::Error
            }
        }
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::Json(err) => {
            if err.is_io() {
                IngestionSeverity::Critical
            } else {
                IngestionSeverity::Error
            }
        }
        IngestionError::SchemaMismatch { .. } => IngestionSeverity::Error,
        IngestionError::ParseError { .. } => IngestionSeverity::Error,
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

fn infer_format_from_path(path: &Path) -> IngestionResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| IngestionError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}
