//! Typed events and text normalization for game-server logs.
//!
//! This crate holds the pure, stateless part of the pipeline: turning raw
//! log lines into [`LogEvent`]s and cleaning up their free text. It is a
//! dependency for the other crates in the workspace.

pub mod event;
pub mod normalize;
pub mod patterns;
pub mod timestamp;

// Re-export timestamp types
pub use timestamp::{LogTimestamp, ParseTimestampError, TIMESTAMP_FORMAT, TIME_OF_DAY_FORMAT};

// Re-export event types
pub use event::{Category, LogEvent};

// Re-export normalization helpers
pub use normalize::{
    apply_mapping, clean_death_message, Substitution, SubstitutionTable, UNKNOWN_CAUSE,
};
