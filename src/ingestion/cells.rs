//! Cell conversions shared by the format readers.

use crate::error::{IngestionError, IngestionResult};

/// Station names must be present; an empty name would silently merge unrelated rows.
pub(crate) fn station(row: usize, column: &str, raw: &str) -> IngestionResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::parse(row, column, raw, "empty station name"));
    }
    Ok(trimmed.to_owned())
}

/// Parse a textual passenger count. The upper bound is checked during compaction.
pub(crate) fn count_from_text(row: usize, column: &str, raw: &str) -> IngestionResult<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::parse(row, column, raw, "missing passenger count"));
    }
    let v = trimmed
        .parse::<i64>()
        .map_err(|e| IngestionError::parse(row, column, raw, e.to_string()))?;
    count_from_i64(row, column, v)
}

/// Counts must be non-negative; a negative count fails the file, not the run.
pub(crate) fn count_from_i64(row: usize, column: &str, v: i64) -> IngestionResult<i64> {
    if v < 0 {
        return Err(IngestionError::parse(row, column, v.to_string(), "negative passenger count"));
    }
    Ok(v)
}

/// Widen an unsigned count to `i64`.
pub(crate) fn count_from_u64(row: usize, column: &str, v: u64) -> IngestionResult<i64> {
    i64::try_from(v)
        .map_err(|_| IngestionError::parse(row, column, v.to_string(), "u64 out of range for i64"))
}

#[cfg(test)]
mod tests {
    use super::{count_from_i64, count_from_text, count_from_u64, station};

    #[test]
    fn station_is_trimmed_and_required() {
        assert_eq!(station(2, "entry_station", "  台北車站 ").unwrap(), "台北車站");
        let err = station(2, "entry_station", "   ").unwrap_err();
        assert!(err.to_string().contains("empty station name"));
    }

    #[test]
    fn count_parses_integers_only() {
        assert_eq!(count_from_text(2, "passenger_count", " 42 ").unwrap(), 42);
        assert!(count_from_text(2, "passenger_count", "4.5").is_err());
        assert!(count_from_text(2, "passenger_count", "").is_err());
    }

    #[test]
    fn negative_counts_are_rejected() {
        let err = count_from_text(3, "passenger_count", "-3").unwrap_err();
        assert!(err.to_string().contains("negative passenger count"));
        assert!(count_from_i64(3, "passenger_count", -1).is_err());
        assert_eq!(count_from_i64(3, "passenger_count", 0).unwrap(), 0);
        assert_eq!(count_from_u64(3, "passenger_count", 7).unwrap(), 7);
    }
}
