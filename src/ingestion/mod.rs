//! Raw record ingestion.
//!
//! Most callers should use [`load`] / [`load_with_options`] (from [`unified`]) which:
//!
//! - scan a directory for CSV / JSON / Parquet files in file-name order
//! - parse each file against the expected [`crate::config::OdColumns`]
//! - skip and report files that fail, via `tracing` and an optional [`PipelineObserver`]
//! - concatenate everything into one [`crate::types::UnifiedTable`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - [`parquet`]

mod cells;
pub mod csv;
pub mod json;
pub mod observability;
pub mod parquet;
pub mod unified;

pub use observability::{
    CompositeObserver, FileContext, FileObserver, FileStats, IngestionSeverity, PipelineObserver, RowDropStats,
    StdErrObserver,
};
pub use unified::{
    discover_files, ingest_file, load, load_with_options, severity_for_error, IngestionFormat, LoadOptions,
};
