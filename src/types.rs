//! Record and table types passed between pipeline stages.
//!
//! Each stage owns its output exclusively: [`UnifiedTable`] is produced by ingestion and consumed
//! by normalization, [`NormalizedTable`] is consumed by compaction, and so on. No stage mutates a
//! value produced by another stage.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::ingestion::{IngestionFormat, IngestionSeverity};

/// One hourly origin-destination row exactly as read from an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Calendar date text, normally `YYYY-MM-DD`.
    pub date: String,
    /// Hour-of-day cell text. Kept as text so that malformed hours are dropped during
    /// normalization instead of failing the whole file.
    pub hour: String,
    pub entry_station: String,
    pub exit_station: String,
    pub passenger_count: i64,
}

/// A file that was parsed successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub format: IngestionFormat,
    pub rows: usize,
}

/// A file that was skipped because it could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub severity: IngestionSeverity,
    /// Rendered [`crate::IngestionError`].
    pub error: String,
}

/// Per-file outcome of a directory load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Successfully parsed files, in load order.
    pub loaded: Vec<LoadedFile>,
    /// Skipped files, in load order.
    pub skipped: Vec<SkippedFile>,
}

/// All raw records from every readable file in a directory.
///
/// Records keep file-name order across files and row order within each file. Duplicates are
/// kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedTable {
    pub records: Vec<RawRecord>,
    pub report: LoadReport,
}

impl UnifiedTable {
    /// Create a table from records with an empty load report.
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            report: LoadReport::default(),
        }
    }

    /// Number of records.
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// `true` when there is nothing to aggregate (no files, no readable files, or no rows).
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A [`RawRecord`] whose `date` and `hour` were replaced by an hour-aligned timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    /// Always on an hour boundary (minutes and seconds are zero).
    pub timestamp: NaiveDateTime,
    pub entry_station: String,
    pub exit_station: String,
    pub passenger_count: i64,
}

/// Output of [`crate::processing::normalize()`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTable {
    pub records: Vec<NormalizedRecord>,
    /// Rows discarded because no valid timestamp could be built.
    pub dropped: usize,
}

impl NormalizedTable {
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Which station column of an OD record a total is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Grouped by `entry_station`.
    Entry,
    /// Grouped by `exit_station`.
    Exit,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Entry => f.write_str("entry"),
            Side::Exit => f.write_str("exit"),
        }
    }
}
