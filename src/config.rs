//! Pipeline configuration.
//!
//! Callers that build options in code use [`crate::ingestion::LoadOptions`] and
//! [`crate::processing::NormalizeOptions`] directly. [`PipelineConfig`] is the serializable form
//! covering both, suitable for a JSON config file:
//!
//! ```json
//! {
//!   "columns": { "date": "日期", "hour": "時段", "entry_station": "進站",
//!                "exit_station": "出站", "passenger_count": "人次" },
//!   "file_pattern": "*.csv",
//!   "execution": { "max_in_flight_files": 2 }
//! }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::execution::ExecutionOptions;
use crate::ingestion::{IngestionFormat, IngestionSeverity, LoadOptions, PipelineObserver};
use crate::processing::NormalizeOptions;

/// Default `chrono` format for the `date` column.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Header names of the five OD columns.
///
/// Names must match input headers exactly (after trimming). Column order in the file does not
/// matter and extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OdColumns {
    pub date: String,
    pub hour: String,
    pub entry_station: String,
    pub exit_station: String,
    pub passenger_count: String,
}

impl Default for OdColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            hour: "hour".to_string(),
            entry_station: "entry_station".to_string(),
            exit_station: "exit_station".to_string(),
            passenger_count: "passenger_count".to_string(),
        }
    }
}

impl OdColumns {
    /// Headers used by the Taipei Metro hourly OD open-data export.
    pub fn taipei_metro() -> Self {
        Self {
            date: "日期".to_string(),
            hour: "時段".to_string(),
            entry_station: "進站".to_string(),
            exit_station: "出站".to_string(),
            passenger_count: "人次".to_string(),
        }
    }

    /// Column names in canonical order: date, hour, entry, exit, count.
    pub fn names(&self) -> [&str; 5] {
        [
            self.date.as_str(),
            self.hour.as_str(),
            self.entry_station.as_str(),
            self.exit_station.as_str(),
            self.passenger_count.as_str(),
        ]
    }
}

/// Serializable configuration for a full [`crate::pipeline::run`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: OdColumns,
    /// `chrono` format of the `date` column.
    pub date_format: String,
    /// Force one format for every file instead of inferring it from the extension.
    pub format: Option<IngestionFormat>,
    /// Glob matched against file names, e.g. `"*.csv"`.
    pub file_pattern: Option<String>,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Parse files in parallel when set.
    pub execution: Option<ExecutionOptions>,
    /// Severity at which skipped files are escalated to `on_alert`.
    pub alert_at_or_above: IngestionSeverity,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: OdColumns::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            format: None,
            file_pattern: None,
            recursive: false,
            execution: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl PipelineConfig {
    /// Parse a config from JSON. Missing keys take their default values.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Build ingestion options, validating `file_pattern`.
    pub fn load_options(
        &self,
        observer: Option<Arc<dyn PipelineObserver>>,
    ) -> Result<LoadOptions, ConfigError> {
        let file_pattern = match &self.file_pattern {
            Some(p) => Some(glob::Pattern::new(p).map_err(|source| ConfigError::InvalidPattern {
                pattern: p.clone(),
                source,
            })?),
            None => None,
        };

        Ok(LoadOptions {
            columns: self.columns.clone(),
            format: self.format,
            file_pattern,
            recursive: self.recursive,
            execution: self.execution.clone(),
            observer,
            alert_at_or_above: self.alert_at_or_above,
        })
    }

    /// Build normalization options.
    pub fn normalize_options(&self, observer: Option<Arc<dyn PipelineObserver>>) -> NormalizeOptions {
        NormalizeOptions {
            date_format: self.date_format.clone(),
            observer,
        }
    }
}
