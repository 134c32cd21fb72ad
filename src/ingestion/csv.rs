//! CSV ingestion implementation.

use std::path::Path;

use crate::config::OdColumns;
use crate::error::{IngestionError, IngestionResult};
use crate::types::RawRecord;

use super::cells;

/// Ingest an OD CSV file into raw records.
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all [`OdColumns`] (order can differ, extra columns are ignored).
/// - Stations must be non-empty and the passenger count must be an integer; anything else fails
///   the whole file.
/// - `date` and `hour` are kept as text; their validity is checked during normalization.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, columns: &OdColumns) -> IngestionResult<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, columns)
}

/// Ingest OD records from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    columns: &OdColumns,
) -> IngestionResult<Vec<RawRecord>> {
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            // Spreadsheet exports often prefix the first header with a BOM.
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_owned()
        })
        .collect();

    // Map OD columns -> CSV column indexes (allows re-ordered CSV columns).
    let mut idx = [0usize; 5];
    for (slot, name) in idx.iter_mut().zip(columns.names()) {
        match headers.iter().position(|h| h == name) {
            Some(i) => *slot = i,
            None => {
                return Err(IngestionError::SchemaMismatch {
                    message: format!("missing required column '{name}'. headers={headers:?}"),
                });
            }
        }
    }
    let [date_idx, hour_idx, entry_idx, exit_idx, count_idx] = idx;

    let mut out = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        out.push(RawRecord {
            date: cell(date_idx).trim().to_owned(),
            hour: cell(hour_idx).trim().to_owned(),
            entry_station: cells::station(user_row, &columns.entry_station, cell(entry_idx))?,
            exit_station: cells::station(user_row, &columns.exit_station, cell(exit_idx))?,
            passenger_count: cells::count_from_text(user_row, &columns.passenger_count, cell(count_idx))?,
        });
    }

    Ok(out)
}
