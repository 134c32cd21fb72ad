//! In-memory pipeline stages.
//!
//! The processing layer operates on the [`crate::types::UnifiedTable`] produced by ingestion.
//! Each stage is a one-shot batch transform that produces a new value:
//!
//! - [`normalize()`]: `date` + `hour` → hour-aligned timestamp, dropping unparsable rows
//! - [`compact()`]: interned station ids and `u32` passenger counts (lossless, fatal on overflow)
//! - [`aggregate()`]: per-(timestamp, station) sums for the entry side and the exit side
//! - [`merge()`]: one station's hourly entries / exits / total
//!
//! ## Example: normalize → compact → aggregate → merge
//!
//! ```rust
//! use ridership_processing::processing::{aggregate, compact, merge, normalize};
//! use ridership_processing::types::{RawRecord, UnifiedTable};
//!
//! let row = |hour: &str, entry: &str, exit: &str, n: i64| RawRecord {
//!     date: "2024-01-01".to_string(),
//!     hour: hour.to_string(),
//!     entry_station: entry.to_string(),
//!     exit_station: exit.to_string(),
//!     passenger_count: n,
//! };
//! let table = UnifiedTable::new(vec![
//!     row("8", "A", "B", 10),
//!     row("8", "C", "A", 5),
//!     row("24", "A", "B", 99), // dropped: no such hour
//! ]);
//!
//! let normalized = normalize(table);
//! assert_eq!(normalized.dropped, 1);
//!
//! let compacted = compact(&normalized).unwrap();
//! let (entries, exits) = aggregate(&compacted).unwrap();
//! let series = merge(&entries, &exits, "A").unwrap();
//!
//! assert_eq!(series.len(), 1);
//! assert_eq!(series.rows[0].entries, 10);
//! assert_eq!(series.rows[0].exits, 5);
//! assert_eq!(series.rows[0].total, 15);
//! ```

pub mod aggregate;
pub mod compact;
pub mod merge;
pub mod normalize;

pub use aggregate::{aggregate, StationTotals};
pub use compact::{compact, compact_with_dictionary, CompactedRecord, CompactedTable, StationDictionary, StationId};
pub use merge::{merge, StationHour, StationTimeSeries};
pub use normalize::{hour_timestamp, normalize, normalize_with_options, NormalizeOptions};
