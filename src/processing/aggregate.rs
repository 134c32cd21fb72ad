//! Station aggregation: per-(timestamp, station) passenger sums for each side.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::OverflowError;
use crate::types::Side;

use super::compact::{CompactedTable, StationDictionary, StationId};

/// Summed passenger counts keyed by (timestamp, station) for one [`Side`].
///
/// Keys that are absent mean zero.
#[derive(Debug, Clone)]
pub struct StationTotals {
    side: Side,
    dictionary: Arc<StationDictionary>,
    totals: HashMap<(NaiveDateTime, StationId), u64>,
}

impl StationTotals {
    fn new(side: Side, dictionary: Arc<StationDictionary>) -> Self {
        Self {
            side,
            dictionary,
            totals: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Dictionary the station ids of this mapping refer to.
    pub fn dictionary(&self) -> &StationDictionary {
        &self.dictionary
    }

    /// Number of distinct (timestamp, station) keys.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Total for one key; zero when the key was never observed.
    pub fn get(&self, timestamp: NaiveDateTime, station: &str) -> u64 {
        self.dictionary
            .id_of(station)
            .and_then(|id| self.totals.get(&(timestamp, id)).copied())
            .unwrap_or(0)
    }

    /// Iterate `((timestamp, station), total)` in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&(NaiveDateTime, StationId), &u64)> {
        self.totals.iter()
    }

    /// Sum over every key. Widened so that summing many `u64` totals cannot overflow.
    pub fn grand_total(&self) -> u128 {
        self.totals.values().map(|&v| u128::from(v)).sum()
    }

    /// The `timestamp → total` series of one station, ascending. Empty for unknown stations.
    pub fn for_station(&self, station: &str) -> BTreeMap<NaiveDateTime, u64> {
        let Some(id) = self.dictionary.id_of(station) else {
            return BTreeMap::new();
        };
        self.totals
            .iter()
            .filter(|((_, s), _)| *s == id)
            .map(|(&(ts, _), &v)| (ts, v))
            .collect()
    }

    fn accumulate(&mut self, timestamp: NaiveDateTime, station: StationId, count: u32) -> Result<(), OverflowError> {
        let slot = self.totals.entry((timestamp, station)).or_insert(0);
        *slot = slot
            .checked_add(u64::from(count))
            .ok_or_else(|| OverflowError::StationTotal {
                side: self.side,
                station: self.dictionary.name(station).unwrap_or_default().to_owned(),
                timestamp,
            })?;
        Ok(())
    }
}

/// Group records by (timestamp, entry_station) and by (timestamp, exit_station).
///
/// Returns `(entry_totals, exit_totals)`. Both share the table's dictionary.
pub fn aggregate(table: &CompactedTable) -> Result<(StationTotals, StationTotals), OverflowError> {
    let mut entries = StationTotals::new(Side::Entry, Arc::clone(&table.dictionary));
    let mut exits = StationTotals::new(Side::Exit, Arc::clone(&table.dictionary));

    for r in &table.records {
        entries.accumulate(r.timestamp, r.entry_station, r.passenger_count)?;
        exits.accumulate(r.timestamp, r.exit_station, r.passenger_count)?;
    }

    tracing::debug!(
        entry_keys = entries.len(),
        exit_keys = exits.len(),
        "aggregated station totals"
    );
    Ok((entries, exits))
}

#[cfg(test)]
mod tests {
    use super::{aggregate, StationTotals};
    use crate::error::OverflowError;
    use crate::processing::compact::{compact, StationDictionary};
    use crate::types::{NormalizedRecord, NormalizedTable, Side};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::sync::Arc;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn rec(h: u32, entry: &str, exit: &str, count: i64) -> NormalizedRecord {
        NormalizedRecord {
            timestamp: at(h),
            entry_station: entry.to_string(),
            exit_station: exit.to_string(),
            passenger_count: count,
        }
    }

    fn aggregated(records: Vec<NormalizedRecord>) -> (StationTotals, StationTotals) {
        let compacted = compact(&NormalizedTable { records, dropped: 0 }).unwrap();
        aggregate(&compacted).unwrap()
    }

    #[test]
    fn sides_are_grouped_independently() {
        let (entries, exits) = aggregated(vec![
            rec(8, "A", "B", 10),
            rec(8, "C", "A", 5),
            rec(8, "A", "C", 2),
            rec(9, "A", "B", 1),
        ]);

        assert_eq!(entries.side(), Side::Entry);
        assert_eq!(exits.side(), Side::Exit);
        assert_eq!(entries.get(at(8), "A"), 12);
        assert_eq!(entries.get(at(8), "C"), 5);
        assert_eq!(entries.get(at(9), "A"), 1);
        assert_eq!(exits.get(at(8), "A"), 5);
        assert_eq!(exits.get(at(8), "B"), 10);
        assert_eq!(exits.get(at(8), "C"), 2);
        assert_eq!(exits.get(at(9), "B"), 1);
    }

    #[test]
    fn key_set_is_exactly_the_observed_keys() {
        let (entries, exits) = aggregated(vec![rec(8, "A", "B", 1), rec(8, "A", "B", 1), rec(9, "A", "C", 1)]);
        assert_eq!(entries.len(), 2);
        assert_eq!(exits.len(), 2);
        assert_eq!(entries.get(at(8), "B"), 0);
        assert_eq!(entries.get(at(8), "nowhere"), 0);
    }

    #[test]
    fn totals_are_conserved() {
        let records = vec![rec(0, "A", "B", 7), rec(23, "B", "A", 11), rec(23, "B", "C", 0), rec(5, "C", "C", 3)];
        let expected: u128 = records.iter().map(|r| r.passenger_count as u128).sum();
        let (entries, exits) = aggregated(records);
        assert_eq!(entries.grand_total(), expected);
        assert_eq!(exits.grand_total(), expected);
    }

    #[test]
    fn for_station_is_sorted_by_timestamp() {
        let (entries, _) = aggregated(vec![rec(9, "A", "B", 1), rec(7, "A", "B", 2), rec(8, "B", "A", 3)]);
        let series: Vec<_> = entries.for_station("A").into_iter().collect();
        assert_eq!(series, vec![(at(7), 2), (at(9), 1)]);
        assert!(entries.for_station("Z").is_empty());
    }

    #[test]
    fn summed_overflow_is_fatal() {
        let mut dict = StationDictionary::new();
        let a = dict.intern("A").unwrap();
        let mut totals = StationTotals::new(Side::Exit, Arc::new(dict));
        totals.totals.insert((at(8), a), u64::MAX - 1);

        totals.accumulate(at(8), a, 1).unwrap();
        let err = totals.accumulate(at(8), a, 1).unwrap_err();

        assert_eq!(
            err,
            OverflowError::StationTotal {
                side: Side::Exit,
                station: "A".to_string(),
                timestamp: at(8),
            }
        );
        assert_eq!(totals.get(at(8), "A"), u64::MAX);
    }
}
