use chrono::NaiveDateTime;
use thiserror::Error;

use crate::types::Side;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned when a single input file cannot be ingested.
///
/// Directory loading treats every variant as recoverable: the file is skipped, reported, and the
/// run continues with the remaining files.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON ingestion error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parquet ingestion error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// The input does not expose the expected OD columns, or its format cannot be determined.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A cell could not be read as the value its column requires.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },
}

impl IngestionError {
    pub(crate) fn parse(
        row: usize,
        column: &str,
        raw: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ParseError {
            row,
            column: column.to_owned(),
            raw: raw.into(),
            message: message.into(),
        }
    }
}

/// A passenger count (raw or summed) no longer fits the integer width it must be stored in.
///
/// Always fatal: continuing would silently corrupt totals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverflowError {
    /// A record's `passenger_count` is outside `0..=u32::MAX`.
    #[error("passenger_count {value} at row {row} does not fit in u32")]
    PassengerCount { row: usize, value: i64 },

    /// Summing one (timestamp, station) group overflowed `u64`.
    #[error("{side} total for station '{station}' at {timestamp} overflows u64")]
    StationTotal {
        side: Side,
        station: String,
        timestamp: NaiveDateTime,
    },

    /// The station dictionary ran out of `u32` identities.
    #[error("station dictionary cannot hold more than {len} stations")]
    Dictionary { len: usize },

    /// `entries + exits` overflowed `u64` for one hour of the merged series.
    #[error("entries + exits for station '{station}' at {timestamp} overflows u64")]
    SeriesTotal {
        station: String,
        timestamp: NaiveDateTime,
    },
}

/// Error type returned by [`crate::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("overflow: {0}")]
    Overflow(#[from] OverflowError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Error type returned while loading a [`crate::config::PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    /// `file_pattern` is not a valid glob.
    #[error("invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
