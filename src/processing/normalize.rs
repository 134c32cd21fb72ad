//! Temporal normalization: `date` + `hour` → one hour-aligned timestamp.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::config::DEFAULT_DATE_FORMAT;
use crate::ingestion::{PipelineObserver, RowDropStats};
use crate::types::{NormalizedRecord, NormalizedTable, UnifiedTable};

/// Options for [`normalize_with_options`].
#[derive(Clone)]
pub struct NormalizeOptions {
    /// `chrono` format of the `date` text.
    pub date_format: String,
    /// Notified once when rows were dropped.
    pub observer: Option<Arc<dyn PipelineObserver>>,
}

impl fmt::Debug for NormalizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizeOptions")
            .field("date_format", &self.date_format)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            observer: None,
        }
    }
}

/// Normalize with `YYYY-MM-DD` dates.
pub fn normalize(table: UnifiedTable) -> NormalizedTable {
    normalize_with_options(table, &NormalizeOptions::default())
}

/// Replace `date`/`hour` with an hour-aligned timestamp, dropping rows where that fails.
///
/// Dropped rows are counted in [`NormalizedTable::dropped`]; they are never an error.
pub fn normalize_with_options(table: UnifiedTable, options: &NormalizeOptions) -> NormalizedTable {
    let input_rows = table.records.len();
    let datetime_format = format!("{} %H:%M:%S", options.date_format);

    let mut records = Vec::with_capacity(input_rows);
    let mut dropped = 0usize;
    for (idx, raw) in table.records.into_iter().enumerate() {
        match parse_timestamp(&raw.date, &raw.hour, &datetime_format) {
            Some(timestamp) => records.push(NormalizedRecord {
                timestamp,
                entry_station: raw.entry_station,
                exit_station: raw.exit_station,
                passenger_count: raw.passenger_count,
            }),
            None => {
                tracing::debug!(row = idx, date = %raw.date, hour = %raw.hour, "dropping row without valid timestamp");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        tracing::info!(dropped, input_rows, "normalization dropped rows");
        if let Some(obs) = options.observer.as_ref() {
            obs.on_rows_dropped(RowDropStats {
                input_rows,
                dropped_rows: dropped,
            });
        }
    }

    NormalizedTable { records, dropped }
}

/// Build the timestamp for one `date` / `hour` pair.
///
/// The hour must be one or two ASCII digits; it is zero-padded to two digits and combined as
/// `"{date} {HH}:00:00"`.
pub fn hour_timestamp(date: &str, hour: &str, date_format: &str) -> Option<NaiveDateTime> {
    parse_timestamp(date, hour, &format!("{date_format} %H:%M:%S"))
}

fn parse_timestamp(date: &str, hour: &str, datetime_format: &str) -> Option<NaiveDateTime> {
    let hour = hour.trim();
    if hour.is_empty() || hour.len() > 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let text = format!("{} {hour:0>2}:00:00", date.trim());
    NaiveDateTime::parse_from_str(&text, datetime_format).ok()
}

#[cfg(test)]
mod tests {
    use super::{hour_timestamp, normalize, normalize_with_options, NormalizeOptions};
    use crate::types::{RawRecord, UnifiedTable};
    use chrono::{NaiveDate, Timelike};

    fn raw(date: &str, hour: &str) -> RawRecord {
        RawRecord {
            date: date.to_string(),
            hour: hour.to_string(),
            entry_station: "A".to_string(),
            exit_station: "B".to_string(),
            passenger_count: 1,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn single_digit_hour_is_zero_padded() {
        assert_eq!(hour_timestamp("2024-01-01", "8", "%Y-%m-%d"), Some(at(2024, 1, 1, 8)));
        assert_eq!(hour_timestamp("2024-01-01", "08", "%Y-%m-%d"), Some(at(2024, 1, 1, 8)));
    }

    #[test]
    fn first_and_last_hour_of_day() {
        assert_eq!(hour_timestamp("2024-01-01", "0", "%Y-%m-%d"), Some(at(2024, 1, 1, 0)));
        assert_eq!(hour_timestamp("2024-01-01", "23", "%Y-%m-%d"), Some(at(2024, 1, 1, 23)));
    }

    #[test]
    fn malformed_hours_are_rejected() {
        for hour in ["24", "99", "-1", "ab", "", " ", "8.0", "008", "+8"] {
            assert_eq!(hour_timestamp("2024-01-01", hour, "%Y-%m-%d"), None, "hour={hour:?}");
        }
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert_eq!(hour_timestamp("2024-02-30", "1", "%Y-%m-%d"), None);
        assert_eq!(hour_timestamp("not a date", "1", "%Y-%m-%d"), None);
        assert_eq!(hour_timestamp("", "1", "%Y-%m-%d"), None);
    }

    #[test]
    fn custom_date_format() {
        assert_eq!(hour_timestamp("2024/01/31", "5", "%Y/%m/%d"), Some(at(2024, 1, 31, 5)));
    }

    #[test]
    fn normalize_drops_and_counts_bad_rows() {
        let table = UnifiedTable::new(vec![
            raw("2024-01-01", "0"),
            raw("2024-01-01", "24"),
            raw("2024-01-01", "x"),
            raw("2024-01-01", "23"),
        ]);

        let out = normalize(table);

        assert_eq!(out.dropped, 2);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.records[0].timestamp, at(2024, 1, 1, 0));
        assert_eq!(out.records[1].timestamp, at(2024, 1, 1, 23));
        assert!(out.records.iter().all(|r| r.timestamp.minute() == 0 && r.timestamp.second() == 0));
    }

    #[test]
    fn normalize_keeps_order_and_fields() {
        let mut second = raw("2024-01-02", "3");
        second.entry_station = "C".to_string();
        second.passenger_count = 7;
        let out = normalize_with_options(
            UnifiedTable::new(vec![raw("2024-01-01", "1"), second]),
            &NormalizeOptions::default(),
        );

        assert_eq!(out.dropped, 0);
        assert_eq!(out.records[1].entry_station, "C");
        assert_eq!(out.records[1].exit_station, "B");
        assert_eq!(out.records[1].passenger_count, 7);
        assert_eq!(out.records[1].timestamp, at(2024, 1, 2, 3));
    }
}
