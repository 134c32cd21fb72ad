//! `ridership-processing` turns a directory of hourly origin-destination (OD) transit ridership
//! files into one station's hourly entry / exit / total time series.
//!
//! The primary entrypoint is [`pipeline::run`], which chains five stages. Each stage is also
//! usable on its own:
//!
//! 1. [`ingestion::load`]: read every CSV / JSON / Parquet file in a directory into a
//!    [`types::UnifiedTable`]. Unreadable files are skipped and reported, never fatal.
//! 2. [`processing::normalize()`]: build an hour-aligned timestamp from `date` + `hour`; rows
//!    where that fails are dropped and counted.
//! 3. [`processing::compact()`]: intern station names and narrow counts to `u32`. Lossless; a
//!    count that does not fit is a fatal [`OverflowError`].
//! 4. [`processing::aggregate()`]: sum counts per (timestamp, station) for the entry side and the
//!    exit side.
//! 5. [`processing::merge()`]: outer-join one station's entry and exit totals by hour.
//!
//! ## Input files
//!
//! Every file must expose five columns, matched exactly by header name (see
//! [`config::OdColumns`]). Column order does not matter and extra columns are ignored.
//!
//! | column            | content                         |
//! |-------------------|---------------------------------|
//! | `date`            | `YYYY-MM-DD`                    |
//! | `hour`            | `0`–`23`                        |
//! | `entry_station`   | station where the trip started  |
//! | `exit_station`    | station where the trip ended    |
//! | `passenger_count` | non-negative integer            |
//!
//! **File formats (auto-detected by extension):**
//!
//! - **CSV**: `.csv`
//! - **JSON**: `.json` (array-of-objects) and `.ndjson` (newline-delimited objects)
//! - **Parquet**: `.parquet`, `.pq`
//!
//! ## Quick example
//!
//! ```no_run
//! use ridership_processing::config::PipelineConfig;
//! use ridership_processing::pipeline::run;
//!
//! # fn main() -> Result<(), ridership_processing::PipelineError> {
//! let out = run("data/raw", "Taipei Main Station", &PipelineConfig::default())?;
//! if out.series.is_empty() {
//!     eprintln!("station not found ({} files loaded)", out.report.files_loaded);
//! }
//! let df = out.series.to_dataframe().expect("dataframe");
//! println!("{df}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! - Per-file problems ([`IngestionError`]) skip the file and surface through `tracing`,
//!   [`ingestion::PipelineObserver`] and [`types::LoadReport`].
//! - Rows without a valid timestamp are dropped and counted.
//! - [`OverflowError`] is the only fatal condition.
//! - Empty results are normal values: check `is_empty()`.
//!
//! ## Modules
//!
//! - [`ingestion`]: directory loading and format-specific readers
//! - [`processing`]: normalize / compact / aggregate / merge
//! - [`execution`]: parallel per-file parsing with throttling and metrics
//! - [`pipeline`]: end-to-end run
//! - [`config`]: column names and serializable pipeline configuration
//! - [`types`]: records and tables passed between stages
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{ConfigError, IngestionError, IngestionResult, OverflowError, PipelineError};
