//! Temporal storm tracking.
//!
//! Storm notifications arrive as loose markers ("approaching", "imminent",
//! "waning"). Markers are collected during a run and only correlated once
//! the run is over, because files may deliver them out of order or with a
//! half of the pair missing.

use serde::{Deserialize, Serialize};

use log_events::{LogEvent, LogTimestamp};

/// Substring that marks a notification as storm-related.
pub const STORM_MARKER: &str = "temporal storm";

const APPROACHING: &str = "temporal storm is approaching";
const IMMINENT: &str = "temporal storm is imminent";
const WANING: &str = "temporal storm seems to be waning";

/// A storm whose start and end were both observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StormInterval {
    pub start: LogTimestamp,
    pub end: LogTimestamp,
}

impl StormInterval {
    /// Creates a new interval.
    pub fn new(start: LogTimestamp, end: LogTimestamp) -> Self {
        Self { start, end }
    }

    /// Length in fractional minutes.
    pub fn minutes(&self) -> f64 {
        self.start.minutes_until(&self.end)
    }

    /// Length in whole minutes, truncated.
    pub fn whole_minutes(&self) -> i64 {
        self.start.whole_minutes_until(&self.end)
    }
}

/// Extremes of each marker kind over a whole run, each tracked on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StormFallback {
    /// Earliest "approaching" marker
    pub approaching: Option<LogTimestamp>,
    /// Earliest "imminent" marker
    pub imminent: Option<LogTimestamp>,
    /// Latest "waning" marker
    pub waning: Option<LogTimestamp>,
}

/// What can be said about storms after a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StormOutlook {
    /// Two or more complete storms
    Several { count: usize, average_minutes: i64 },
    /// A single storm, paired or reconstructed from the fallback extremes
    Occurred { start: LogTimestamp, minutes: i64 },
    /// A storm started but no end was seen
    Imminent,
    /// Only the early warning was seen
    Approaching { at: LogTimestamp },
    /// Only the end was seen
    Ending { at: LogTimestamp },
    /// Nothing storm-related happened
    Calm,
}

/// Collects storm notifications for one run.
#[derive(Debug, Clone, Default)]
pub struct StormTracker {
    events: Vec<LogEvent>,
}

impl StormTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `lower_message` is storm-related.
    pub fn is_storm_message(lower_message: &str) -> bool {
        lower_message.contains(STORM_MARKER)
    }

    /// Records a raw storm notification.
    pub fn record(&mut self, event: LogEvent) {
        self.events.push(event);
    }

    /// Number of recorded notifications.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pairs "imminent" markers with the next "waning" marker.
    ///
    /// Markers are walked in timestamp order. A second "imminent" before any
    /// "waning" replaces the pending start, so only the latest unmatched
    /// start can be closed. A "waning" with nothing pending is dropped.
    pub fn complete_intervals(&self) -> Vec<StormInterval> {
        let mut ordered: Vec<&LogEvent> = self.events.iter().collect();
        ordered.sort_by_key(|e| e.timestamp);

        let mut intervals = Vec::new();
        let mut pending: Option<LogTimestamp> = None;

        for event in ordered {
            let lower = event.lower_message();
            if lower.contains(IMMINENT) {
                pending = Some(event.timestamp);
            } else if lower.contains(WANING) {
                if let Some(start) = pending.take() {
                    intervals.push(StormInterval::new(start, event.timestamp));
                }
            }
        }

        intervals
    }

    /// Computes the earliest approaching/imminent and latest waning markers.
    pub fn fallback(&self) -> StormFallback {
        let mut fallback = StormFallback::default();

        for event in &self.events {
            let lower = event.lower_message();
            let ts = event.timestamp;
            if lower.contains(APPROACHING) {
                fallback.approaching = Some(fallback.approaching.map_or(ts, |t| t.min(ts)));
            }
            if lower.contains(IMMINENT) {
                fallback.imminent = Some(fallback.imminent.map_or(ts, |t| t.min(ts)));
            }
            if lower.contains(WANING) {
                fallback.waning = Some(fallback.waning.map_or(ts, |t| t.max(ts)));
            }
        }

        fallback
    }

    /// Decides what to report about storms.
    ///
    /// The average over several storms is rounded half-to-even; single
    /// durations are truncated to whole minutes.
    pub fn outlook(&self) -> StormOutlook {
        let intervals = self.complete_intervals();

        match intervals.as_slice() {
            [] => Self::fallback_outlook(self.fallback()),
            [only] => StormOutlook::Occurred {
                start: only.start,
                minutes: only.whole_minutes(),
            },
            many => {
                let total: f64 = many.iter().map(StormInterval::minutes).sum();
                let average = total / many.len() as f64;
                StormOutlook::Several {
                    count: many.len(),
                    average_minutes: average.round_ties_even() as i64,
                }
            }
        }
    }

    fn fallback_outlook(fallback: StormFallback) -> StormOutlook {
        match fallback {
            StormFallback {
                imminent: Some(start),
                waning: Some(end),
                ..
            } => StormOutlook::Occurred {
                start,
                minutes: start.whole_minutes_until(&end),
            },
            StormFallback {
                imminent: Some(_), ..
            } => StormOutlook::Imminent,
            StormFallback {
                approaching: Some(at),
                ..
            } => StormOutlook::Approaching { at },
            StormFallback { waning: Some(at), .. } => StormOutlook::Ending { at },
            _ => StormOutlook::Calm,
        }
    }
}
