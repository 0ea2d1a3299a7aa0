//! Log Timestamp Types
//!
//! Game-server logs stamp every line with a local wall-clock time in
//! `DD.MM.YYYY HH:MM:SS` form. The same textual form is used when a
//! timestamp is persisted between runs.
//!
//! # Example
//!
//! ```
//! use log_events::LogTimestamp;
//!
//! let ts: LogTimestamp = "12.05.2024 10:00:00".parse().unwrap();
//! assert_eq!(ts.time_of_day(), "10:00:00");
//! assert_eq!(ts.to_string(), "12.05.2024 10:00:00");
//! ```

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Format of the timestamp at the start of every log line.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Format used when only the time of day is rendered.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// Error type for parsing a LogTimestamp from a string.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid timestamp '{input}', expected 'DD.MM.YYYY HH:MM:SS'")]
pub struct ParseTimestampError {
    pub input: String,
}

/// A second-precision point in time, in the log source's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogTimestamp(NaiveDateTime);

impl LogTimestamp {
    /// Builds a timestamp from calendar parts, if they form a valid date-time.
    pub fn from_parts(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, min, sec))
            .map(Self)
    }

    /// Renders only the `HH:MM:SS` part.
    pub fn time_of_day(&self) -> String {
        self.0.format(TIME_OF_DAY_FORMAT).to_string()
    }

    /// Signed distance to `later`, in fractional minutes.
    pub fn minutes_until(&self, later: &LogTimestamp) -> f64 {
        (later.0 - self.0).num_seconds() as f64 / 60.0
    }

    /// Signed distance to `later` in whole minutes, truncated toward zero.
    pub fn whole_minutes_until(&self, later: &LogTimestamp) -> i64 {
        (later.0 - self.0).num_seconds() / 60
    }

    /// Moves the timestamp back by `span`, or `None` on calendar overflow.
    pub fn checked_sub(&self, span: Duration) -> Option<Self> {
        self.0.checked_sub_signed(span).map(Self)
    }
}

impl fmt::Display for LogTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for LogTimestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|_| ParseTimestampError {
                input: s.to_string(),
            })
    }
}

// Serialized as the plain log-line string, not as a struct
impl Serialize for LogTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LogTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
