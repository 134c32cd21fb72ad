//! End-to-end run: load → normalize → compact → aggregate → merge.

use std::path::Path;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::ingestion::{load_with_options, PipelineObserver};
use crate::processing::{aggregate, compact, merge, normalize_with_options, StationTimeSeries};

/// Counts describing what a run consumed and discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub rows_ingested: usize,
    /// Rows dropped for lacking a valid timestamp.
    pub rows_dropped: usize,
    /// Distinct station names seen on either side.
    pub stations: usize,
}

/// Result of [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub series: StationTimeSeries,
    pub report: PipelineReport,
}

/// Run the full pipeline for `target_station` over every file in `directory`.
///
/// Skipped files and dropped rows are reported, not returned as errors. An empty
/// [`PipelineOutput::series`] means there was nothing to aggregate or the station does not occur;
/// the report tells the two apart.
///
/// # Errors
///
/// [`PipelineError::Overflow`] when a count does not fit its integer width, and
/// [`PipelineError::Config`] for an invalid `file_pattern`.
///
/// ```no_run
/// use ridership_processing::config::{OdColumns, PipelineConfig};
/// use ridership_processing::pipeline::run;
///
/// # fn main() -> Result<(), ridership_processing::PipelineError> {
/// let config = PipelineConfig {
///     columns: OdColumns::taipei_metro(),
///     ..Default::default()
/// };
/// let out = run("data/raw", "台北車站", &config)?;
/// for hour in &out.series.rows {
///     println!("{} in={} out={} total={}", hour.timestamp, hour.entries, hour.exits, hour.total);
/// }
/// # Ok(())
/// # }
/// ```
pub fn run(
    directory: impl AsRef<Path>,
    target_station: &str,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    run_with_observer(directory, target_station, config, None)
}

/// [`run`] with an observer for skipped files and dropped rows.
pub fn run_with_observer(
    directory: impl AsRef<Path>,
    target_station: &str,
    config: &PipelineConfig,
    observer: Option<Arc<dyn PipelineObserver>>,
) -> Result<PipelineOutput, PipelineError> {
    let directory = directory.as_ref();
    let load_options = config.load_options(observer.clone())?;
    let normalize_options = config.normalize_options(observer);

    tracing::info!(dir = %directory.display(), station = target_station, "pipeline started");

    let table = load_with_options(directory, &load_options);
    let mut report = PipelineReport {
        files_loaded: table.report.loaded.len(),
        files_skipped: table.report.skipped.len(),
        rows_ingested: table.row_count(),
        ..Default::default()
    };
    if table.is_empty() {
        tracing::warn!(dir = %directory.display(), "nothing to aggregate");
        return Ok(PipelineOutput {
            series: StationTimeSeries {
                station: target_station.to_owned(),
                rows: Vec::new(),
            },
            report,
        });
    }

    let normalized = normalize_with_options(table, &normalize_options);
    report.rows_dropped = normalized.dropped;

    let compacted = compact(&normalized)?;
    drop(normalized);
    report.stations = compacted.dictionary.len();

    let (entries, exits) = aggregate(&compacted)?;
    let series = merge(&entries, &exits, target_station)?;

    tracing::info!(
        station = target_station,
        hours = series.len(),
        files = report.files_loaded,
        skipped = report.files_skipped,
        dropped = report.rows_dropped,
        "pipeline finished"
    );
    Ok(PipelineOutput { series, report })
}
