//! Typed log events and the line parser that produces them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::patterns;
use crate::timestamp::LogTimestamp;

/// Classification tag emitted by the log source, e.g. `[Audit]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Player actions: deaths, kills, inventory moves
    Audit,
    /// Server broadcasts, including temporal storm warnings
    Notification,
    /// Server housekeeping, including chunk saves
    Event,
    /// Any other tag, kept verbatim (empty when the line has no tag)
    Other(String),
}

impl Category {
    /// Returns the tag text as it appears in the log.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Audit => "Audit",
            Category::Notification => "Notification",
            Category::Event => "Event",
            Category::Other(s) => s,
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s {
            "Audit" => Category::Audit,
            "Notification" => Category::Notification,
            "Event" => Category::Event,
            other => Category::Other(other.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::from(s.as_str())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped line of a server log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// When the line was written
    pub timestamp: LogTimestamp,
    /// First bracketed tag after the timestamp
    pub category: Category,
    /// Free text after the tag, trimmed
    pub message: String,
}

impl LogEvent {
    /// Creates a new event.
    pub fn new(timestamp: LogTimestamp, category: impl Into<Category>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            category: category.into(),
            message: message.into(),
        }
    }

    /// Parses one raw log line.
    ///
    /// Returns `None` unless the line starts with a valid
    /// `DD.MM.YYYY HH:MM:SS` timestamp. A missing tag gives an empty
    /// category, and a missing closing bracket gives an empty message.
    pub fn from_line(line: &str) -> Option<Self> {
        let stamp = patterns::leading_timestamp(line)?;
        let timestamp: LogTimestamp = stamp.parse().ok()?;

        let rest = &line[stamp.len()..];
        let category = patterns::bracketed_category(rest).unwrap_or("");
        let message = match rest.find(']') {
            Some(end) => rest[end + 1..].trim(),
            None => "",
        };

        Some(Self::new(timestamp, category, message))
    }

    /// Lower-cased copy of the message, for case-insensitive keyword tests.
    pub fn lower_message(&self) -> String {
        self.message.to_lowercase()
    }
}
