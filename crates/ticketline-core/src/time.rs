//! Timestamp parsing for ticket and event date fields.
//!
//! Accepted spellings, tried in order:
//!
//! 1. RFC 3339 with an explicit offset (`2024-01-01T09:00:00Z`).
//! 2. Naive date-time (`2024-01-01T09:00`, `2024-01-01 09:00:00.250`),
//!    read at the parser's source offset.
//! 3. Bare date (`2024-01-01`), midnight at the source offset.
//! 4. JSON integers, read as Unix epoch milliseconds.
//!
//! Instants outside years 1 through 9999 are rejected, whatever the spelling.

use chrono::{Datelike, DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde_json::Value;

const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Inclusive range of accepted calendar years (UTC).
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// A value that does not resolve to a valid instant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp '{raw}'")]
pub struct InvalidTimestamp {
    /// The offending input, rendered as text.
    pub raw: String,
}

impl InvalidTimestamp {
    fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

/// Parses source timestamps into UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampParser {
    source_offset: FixedOffset,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self {
            source_offset: Utc.fix(),
        }
    }
}

impl TimestampParser {
    /// Parser that reads offset-less timestamps at `source_offset`.
    #[must_use]
    pub const fn new(source_offset: FixedOffset) -> Self {
        Self { source_offset }
    }

    /// Parse a JSON value (string or integer milliseconds).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimestamp`] when the value is not one of the
    /// accepted spellings or is out of range.
    pub fn parse_value(&self, value: &Value) -> Result<DateTime<Utc>, InvalidTimestamp> {
        match value {
            Value::String(s) => self.parse_str(s),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .filter(in_range)
                .ok_or_else(|| InvalidTimestamp::new(n.to_string())),
            other => Err(InvalidTimestamp::new(other.to_string())),
        }
    }

    /// Parse a textual timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTimestamp`] when no accepted spelling matches.
    pub fn parse_str(&self, raw: &str) -> Result<DateTime<Utc>, InvalidTimestamp> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(InvalidTimestamp::new(raw));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            let dt = dt.with_timezone(&Utc);
            return if in_range(&dt) {
                Ok(dt)
            } else {
                Err(InvalidTimestamp::new(raw))
            };
        }

        let naive = NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            });

        naive
            .and_then(|naive| self.source_offset.from_local_datetime(&naive).single())
            .map(|dt| dt.with_timezone(&Utc))
            .filter(in_range)
            .ok_or_else(|| InvalidTimestamp::new(raw))
    }
}

fn in_range(instant: &DateTime<Utc>) -> bool {
    YEAR_RANGE.contains(&instant.year())
}
