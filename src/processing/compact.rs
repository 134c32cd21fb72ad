//! Type compaction: interned station names and `u32` passenger counts.
//!
//! Compaction is lossless. [`CompactedTable::decode`] reproduces the source
//! [`NormalizedRecord`] exactly, and any count that does not fit `u32` aborts with
//! [`OverflowError::PassengerCount`] instead of being truncated.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::OverflowError;
use crate::types::{NormalizedRecord, NormalizedTable};

/// Identity of an interned station name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(u32);

impl StationId {
    /// Position of the station in its dictionary.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interning table for station names.
///
/// Ids are assigned in order of first sight and never removed, so the same name always maps to
/// the same id for the lifetime of a dictionary.
#[derive(Debug, Clone, Default)]
pub struct StationDictionary {
    names: Vec<Arc<str>>,
    ids: HashMap<Arc<str>, StationId>,
}

impl StationDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, assigning the next id on first sight.
    pub fn intern(&mut self, name: &str) -> Result<StationId, OverflowError> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        let id = u32::try_from(self.names.len())
            .map(StationId)
            .map_err(|_| OverflowError::Dictionary { len: self.names.len() })?;
        let name: Arc<str> = Arc::from(name);
        self.names.push(Arc::clone(&name));
        self.ids.insert(name, id);
        Ok(id)
    }

    /// Look up an already interned name.
    pub fn id_of(&self, name: &str) -> Option<StationId> {
        self.ids.get(name).copied()
    }

    /// Resolve an id back to its name.
    pub fn name(&self, id: StationId) -> Option<&str> {
        self.names.get(id.index()).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(id, name)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (StationId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (StationId(i as u32), name.as_ref()))
    }
}

/// A [`NormalizedRecord`] with interned stations and a `u32` count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactedRecord {
    pub timestamp: NaiveDateTime,
    pub entry_station: StationId,
    pub exit_station: StationId,
    pub passenger_count: u32,
}

/// Output of [`compact`]: records plus the dictionary their station ids refer to.
#[derive(Debug, Clone)]
pub struct CompactedTable {
    pub dictionary: Arc<StationDictionary>,
    pub records: Vec<CompactedRecord>,
}

impl CompactedTable {
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decode record `idx` back into its normalized form.
    pub fn decode(&self, idx: usize) -> Option<NormalizedRecord> {
        let r = self.records.get(idx)?;
        Some(NormalizedRecord {
            timestamp: r.timestamp,
            entry_station: self.dictionary.name(r.entry_station)?.to_owned(),
            exit_station: self.dictionary.name(r.exit_station)?.to_owned(),
            passenger_count: i64::from(r.passenger_count),
        })
    }
}

/// Compact records into a fresh dictionary.
pub fn compact(table: &NormalizedTable) -> Result<CompactedTable, OverflowError> {
    compact_with_dictionary(table, StationDictionary::new())
}

/// Compact records, extending an existing dictionary.
///
/// Ids already present in `dictionary` are kept, so tables compacted against the same
/// dictionary share station identities.
pub fn compact_with_dictionary(
    table: &NormalizedTable,
    mut dictionary: StationDictionary,
) -> Result<CompactedTable, OverflowError> {
    let mut records = Vec::with_capacity(table.records.len());
    for (row, r) in table.records.iter().enumerate() {
        let passenger_count = u32::try_from(r.passenger_count).map_err(|_| OverflowError::PassengerCount {
            row,
            value: r.passenger_count,
        })?;
        records.push(CompactedRecord {
            timestamp: r.timestamp,
            entry_station: dictionary.intern(&r.entry_station)?,
            exit_station: dictionary.intern(&r.exit_station)?,
            passenger_count,
        });
    }

    tracing::debug!(rows = records.len(), stations = dictionary.len(), "compacted records");
    Ok(CompactedTable {
        dictionary: Arc::new(dictionary),
        records,
    })
}
