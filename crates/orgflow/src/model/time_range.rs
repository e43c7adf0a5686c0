//! Half-open UTC time window bounding a sync run.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a range is constructed with `start > end`.
#[derive(Debug, Error)]
#[error("invalid time range: start {start} is after end {end}")]
pub struct InvalidTimeRange {
    /// The offending start instant.
    pub start: DateTime<Utc>,
    /// The offending end instant.
    pub end: DateTime<Utc>,
}

/// A half-open UTC interval `[start, end)`.
///
/// Either bound may be absent, which makes that side unbounded. The
/// invariant `start <= end` holds whenever both bounds are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Create a range from optional bounds.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, InvalidTimeRange> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(InvalidTimeRange { start: s, end: e });
            }
        }
        Ok(Self { start, end })
    }

    /// Create a range with both bounds present.
    pub fn bounded(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidTimeRange> {
        Self::new(Some(start), Some(end))
    }

    /// A range matching every instant.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// A range open on the end side.
    #[must_use]
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Start of the range, if bounded.
    #[must_use]
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// End of the range, if bounded.
    #[must_use]
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// `end - start` when both bounds are present.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(s), Some(e)) => Some(e - s),
            _ => None,
        }
    }

    /// Half-open membership test: `start <= t < end`.
    ///
    /// A missing bound always matches on its side, so an unbounded range
    /// contains every instant.
    #[must_use]
    pub fn is_in_range(&self, timestamp: DateTime<Utc>) -> bool {
        let after_start = self.start.is_none_or(|s| s <= timestamp);
        let before_end = self.end.is_none_or(|e| timestamp < e);
        after_start && before_end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_bound = |b: Option<DateTime<Utc>>| match b {
            Some(t) => t.to_rfc3339(),
            None => "..".to_string(),
        };
        write!(f, "[{}, {})", fmt_bound(self.start), fmt_bound(self.end))
    }
}
