//! Parquet ingestion implementation.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use parquet::file::reader::{ChunkReader, FileReader};
use parquet::file::serialized_reader::SerializedFileReader;
use parquet::record::Field;

use crate::config::OdColumns;
use crate::error::{IngestionError, IngestionResult};
use crate::types::RawRecord;

use super::cells;

/// Days from 0001-01-01 (CE day 1) to the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Ingest an OD Parquet file into raw records.
///
/// Notes:
/// - Validates that all OD columns exist as Parquet leaf columns (by column path string)
/// - `date` may be a UTF-8 string or a `DATE` column; `hour` may be an integer or string column
/// - Uses the Parquet record API (`RowIter`)
pub fn ingest_parquet_from_path(path: impl AsRef<Path>, columns: &OdColumns) -> IngestionResult<Vec<RawRecord>> {
    let reader = SerializedFileReader::try_from(path.as_ref())?;

    let available_columns = parquet_leaf_column_paths(&reader);
    for name in columns.names() {
        if !available_columns.contains(name) {
            return Err(IngestionError::SchemaMismatch {
                message: format!("missing required column '{name}'"),
            });
        }
    }

    let mut out = Vec::new();
    for (idx0, row_res) in reader.into_iter().enumerate() {
        let row_num = idx0 + 1;
        let row = row_res?;

        let map: HashMap<&str, &Field> = row
            .get_column_iter()
            .map(|(name, field)| (name.as_str(), field))
            .collect();
        let get = |name: &str| {
            map.get(name).copied().ok_or_else(|| IngestionError::SchemaMismatch {
                message: format!("row {row_num} missing required column '{name}'"),
            })
        };

        out.push(RawRecord {
            date: date_cell(get(&columns.date)?),
            hour: text_cell(get(&columns.hour)?),
            entry_station: station_cell(row_num, &columns.entry_station, get(&columns.entry_station)?)?,
            exit_station: station_cell(row_num, &columns.exit_station, get(&columns.exit_station)?)?,
            passenger_count: count_cell(row_num, &columns.passenger_count, get(&columns.passenger_count)?)?,
        });
    }

    Ok(out)
}

fn parquet_leaf_column_paths<R: ChunkReader + 'static>(
    reader: &SerializedFileReader<R>,
) -> HashSet<String> {
    reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|c| c.path().string())
        .collect()
}

fn date_cell(f: &Field) -> String {
    match f {
        Field::Date(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        other => text_cell(other),
    }
}

/// Render a value as text; null becomes empty and is dropped during normalization.
fn text_cell(f: &Field) -> String {
    match f {
        Field::Null => String::new(),
        Field::Str(s) => s.trim().to_owned(),
        other => other.to_string(),
    }
}

fn station_cell(row: usize, column: &str, f: &Field) -> IngestionResult<String> {
    match f {
        Field::Str(s) => cells::station(row, column, s),
        Field::Null => Err(IngestionError::parse(row, column, "null", "empty station name")),
        other => Err(IngestionError::parse(row, column, other.to_string(), "expected string")),
    }
}

fn count_cell(row: usize, column: &str, f: &Field) -> IngestionResult<i64> {
    match f {
        Field::Byte(v) => cells::count_from_i64(row, column, i64::from(*v)),
        Field::Short(v) => cells::count_from_i64(row, column, i64::from(*v)),
        Field::Int(v) => cells::count_from_i64(row, column, i64::from(*v)),
        Field::Long(v) => cells::count_from_i64(row, column, *v),
        Field::UByte(v) => Ok(i64::from(*v)),
        Field::UShort(v) => Ok(i64::from(*v)),
        Field::UInt(v) => Ok(i64::from(*v)),
        Field::ULong(v) => cells::count_from_u64(row, column, *v),
        Field::Str(s) => cells::count_from_text(row, column, s),
        Field::Null => Err(IngestionError::parse(row, column, "null", "missing passenger count")),
        other => Err(IngestionError::parse(row, column, other.to_string(), "expected integer")),
    }
}
