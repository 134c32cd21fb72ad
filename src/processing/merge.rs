//! Station merge: outer join of one station's entry and exit totals on timestamp.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;

use crate::error::OverflowError;

use super::aggregate::StationTotals;

/// One hour of a station's activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StationHour {
    pub timestamp: NaiveDateTime,
    pub entries: u64,
    pub exits: u64,
    /// `entries + exits`.
    pub total: u64,
}

/// Hourly entry/exit/total series of a single station, ascending by timestamp.
///
/// Contains exactly the hours in which the station appears on either side; an hour is never
/// dropped because one side is zero. An empty series means the station does not occur in the
/// data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StationTimeSeries {
    pub station: String,
    pub rows: Vec<StationHour>,
}

impl StationTimeSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Timestamps in series order.
    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.rows.iter().map(|r| r.timestamp)
    }

    /// Convert to a polars frame with columns `timestamp` (datetime[μs]), `entries`, `exits`,
    /// `total`.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let micros: Vec<i64> = self.rows.iter().map(|r| r.timestamp.and_utc().timestamp_micros()).collect();
        let entries: Vec<u64> = self.rows.iter().map(|r| r.entries).collect();
        let exits: Vec<u64> = self.rows.iter().map(|r| r.exits).collect();
        let totals: Vec<u64> = self.rows.iter().map(|r| r.total).collect();

        let timestamp = Series::new("timestamp".into(), micros)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

        let mut df = df!(
            "entries" => entries,
            "exits" => exits,
            "total" => totals
        )?;
        df.insert_column(0, timestamp.into())?;
        Ok(df)
    }
}

/// Build the hourly series of `target_station` from entry-side and exit-side totals.
///
/// Missing sides count as zero. Returns an empty series when the station appears on neither
/// side.
pub fn merge(
    entry_totals: &StationTotals,
    exit_totals: &StationTotals,
    target_station: &str,
) -> Result<StationTimeSeries, OverflowError> {
    let mut joined: BTreeMap<NaiveDateTime, (u64, u64)> = BTreeMap::new();
    for (ts, n) in entry_totals.for_station(target_station) {
        joined.entry(ts).or_default().0 = n;
    }
    for (ts, n) in exit_totals.for_station(target_station) {
        joined.entry(ts).or_default().1 = n;
    }

    let rows = joined
        .into_iter()
        .map(|(timestamp, (entries, exits))| {
            let total = entries.checked_add(exits).ok_or_else(|| OverflowError::SeriesTotal {
                station: target_station.to_owned(),
                timestamp,
            })?;
            Ok(StationHour {
                timestamp,
                entries,
                exits,
                total,
            })
        })
        .collect::<Result<Vec<_>, OverflowError>>()?;

    if rows.is_empty() {
        tracing::info!(station = target_station, "station not found in aggregated totals");
    }
    Ok(StationTimeSeries {
        station: target_station.to_owned(),
        rows,
    })
}
