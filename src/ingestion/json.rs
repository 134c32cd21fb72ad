//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"date": "2024-01-01", ...}, ...]`
//! - A single JSON object
//! - Newline-delimited JSON (NDJSON): one object per line
//!
//! `hour` may be a JSON number or string. The passenger count must be an integer number or an
//! integer string.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::config::OdColumns;
use crate::error::{IngestionError, IngestionResult};
use crate::types::RawRecord;

use super::cells;

/// Ingest an OD JSON / NDJSON file into raw records.
pub fn ingest_json_from_path(path: impl AsRef<Path>, columns: &OdColumns) -> IngestionResult<Vec<RawRecord>> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, columns)
}

/// Ingest OD records from an in-memory JSON string.
pub fn ingest_json_from_str(input: &str, columns: &OdColumns) -> IngestionResult<Vec<RawRecord>> {
    let trimmed = input.trim().trim_start_matches('\u{feff}');
    if trimmed.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        match v {
            Value::Array(items) => ingest_json_values(&items, columns),
            Value::Object(_) => ingest_json_values(std::slice::from_ref(&v), columns),
            _ => Err(IngestionError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for line in trimmed.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            values.push(serde_json::from_str::<Value>(line)?);
        }
        ingest_json_values(&values, columns)
    }
}

fn ingest_json_values(values: &[Value], columns: &OdColumns) -> IngestionResult<Vec<RawRecord>> {
    let mut out = Vec::with_capacity(values.len());

    for (idx0, v) in values.iter().enumerate() {
        let row = idx0 + 1;
        let obj = v.as_object().ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!("row {row} is not a json object"),
        })?;

        let date = field(obj, row, &columns.date)?;
        let hour = field(obj, row, &columns.hour)?;
        let entry = field(obj, row, &columns.entry_station)?;
        let exit = field(obj, row, &columns.exit_station)?;
        let count = field(obj, row, &columns.passenger_count)?;

        out.push(RawRecord {
            date: text_cell(date),
            hour: text_cell(hour),
            entry_station: station_cell(row, &columns.entry_station, entry)?,
            exit_station: station_cell(row, &columns.exit_station, exit)?,
            passenger_count: count_cell(row, &columns.passenger_count, count)?,
        });
    }

    Ok(out)
}

fn field<'a>(obj: &'a Map<String, Value>, row: usize, name: &str) -> IngestionResult<&'a Value> {
    obj.get(name).ok_or_else(|| IngestionError::SchemaMismatch {
        message: format!("row {row} missing required field '{name}'"),
    })
}

/// Render a date/hour value as text; null becomes empty and is dropped during normalization.
fn text_cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_owned(),
        other => other.to_string(),
    }
}

fn station_cell(row: usize, column: &str, v: &Value) -> IngestionResult<String> {
    match v {
        Value::String(s) => cells::station(row, column, s),
        Value::Null => Err(IngestionError::parse(row, column, "null", "empty station name")),
        other => Err(IngestionError::parse(row, column, other.to_string(), "expected string")),
    }
}

fn count_cell(row: usize, column: &str, v: &Value) -> IngestionResult<i64> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                cells::count_from_i64(row, column, i)
            } else if let Some(u) = n.as_u64() {
                cells::count_from_u64(row, column, u)
            } else {
                Err(IngestionError::parse(row, column, n.to_string(), "expected integer number"))
            }
        }
        Value::String(s) => cells::count_from_text(row, column, s),
        other => Err(IngestionError::parse(row, column, other.to_string(), "expected integer number")),
    }
}
