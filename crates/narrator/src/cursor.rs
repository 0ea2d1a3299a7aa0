//! Resume cursor and relative time-range arithmetic.
//!
//! A run only looks at events strictly newer than the stored cursor. A
//! configured time range can tighten that lower bound for a single run
//! without affecting what gets persisted.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use log_events::LogTimestamp;

/// Boundary between already-summarized history and new activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCursor {
    /// Latest fully processed event, if any run has completed
    #[serde(default)]
    pub last_timestamp: Option<LogTimestamp>,
    /// Cumulative map chunk count at the end of the last run
    #[serde(default)]
    pub last_chunk_count: u64,
}

impl RunCursor {
    /// Creates a cursor.
    pub fn new(last_timestamp: Option<LogTimestamp>, last_chunk_count: u64) -> Self {
        Self {
            last_timestamp,
            last_chunk_count,
        }
    }

    /// Returns the same cursor with the timestamp dropped.
    ///
    /// The chunk count survives so a full rescan does not report every
    /// chunk as new.
    pub fn without_timestamp(self) -> Self {
        Self {
            last_timestamp: None,
            ..self
        }
    }

    /// Returns true if `timestamp` lies after this cursor.
    pub fn admits(&self, timestamp: LogTimestamp) -> bool {
        self.last_timestamp.map_or(true, |last| timestamp > last)
    }

    /// Computes the cursor to persist after a run.
    ///
    /// The timestamp never moves backwards and neither does the chunk count.
    pub fn advance(&self, max_processed: Option<LogTimestamp>, chunk_counter: u64) -> Self {
        let last_timestamp = match (self.last_timestamp, max_processed) {
            (Some(stored), Some(seen)) => Some(stored.max(seen)),
            (stored, seen) => stored.or(seen),
        };
        Self {
            last_timestamp,
            last_chunk_count: self.last_chunk_count.max(chunk_counter),
        }
    }
}

/// Net new chunks since the prior run, floored at zero.
pub fn net_new_chunks(prior: u64, current: u64) -> u64 {
    current.saturating_sub(prior)
}

/// Unit of a relative time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn from_suffix(suffix: char) -> Option<Self> {
        match suffix {
            'm' => Some(TimeUnit::Minutes),
            'h' => Some(TimeUnit::Hours),
            'd' => Some(TimeUnit::Days),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TimeUnit::Minutes => "minute(s)",
            TimeUnit::Hours => "hour(s)",
            TimeUnit::Days => "day(s)",
        }
    }
}

/// Errors from parsing a time range such as `"2h"`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeRangeError {
    #[error("invalid time range format '{0}'; use <integer><m|h|d>")]
    InvalidFormat(String),

    #[error("time range '{0}' is too large")]
    OutOfRange(String),
}

/// A relative span like "30m", "2h" or "7d".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub value: u32,
    pub unit: TimeUnit,
}

impl TimeRange {
    /// The span as a chrono duration.
    pub fn duration(&self) -> Duration {
        let value = i64::from(self.value);
        match self.unit {
            TimeUnit::Minutes => Duration::minutes(value),
            TimeUnit::Hours => Duration::hours(value),
            TimeUnit::Days => Duration::days(value),
        }
    }

    /// Line put ahead of the summary, e.g. "In the last 2 hour(s)...".
    pub fn preamble(&self) -> String {
        format!("In the last {}...", self)
    }

    /// Lower bound for a run given the newest timestamp seen anywhere.
    ///
    /// The range bound only wins when it is later than the stored cursor.
    pub fn bound(&self, cursor: Option<LogTimestamp>, newest: LogTimestamp) -> Option<LogTimestamp> {
        let from_range = newest.checked_sub(self.duration());
        match (cursor, from_range) {
            (Some(stored), Some(range)) => Some(stored.max(range)),
            (stored, range) => stored.or(range),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.label())
    }
}

impl FromStr for TimeRange {
    type Err = TimeRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let invalid = || TimeRangeError::InvalidFormat(s.to_string());

        let suffix = normalized.chars().last().ok_or_else(invalid)?;
        let unit = TimeUnit::from_suffix(suffix).ok_or_else(invalid)?;
        let digits = &normalized[..normalized.len() - suffix.len_utf8()];
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let value = digits
            .parse::<u32>()
            .map_err(|_| TimeRangeError::OutOfRange(s.to_string()))?;

        Ok(Self { value, unit })
    }
}
