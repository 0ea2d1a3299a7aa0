//! Narrator: turns a batch of server logs into a short story.
//!
//! The narrator sits between the raw log files and whatever publishes the
//! summary. It replays every event newer than the resume cursor, keeps
//! track of who died to what, who killed what, who hauled large amounts of
//! metal around, what the weather did and how much the map grew, then
//! writes it all up as a few lines of prose.
//!
//! # Pipeline
//!
//! ```text
//! ┌────────────┐  LogEvent  ┌────────────┐  AggregationState  ┌───────────┐
//! │ LogSource  │ ─────────▶ │ aggregator │ ─────────────────▶ │ narrative │ ──▶ RunSummary
//! └────────────┘            └────────────┘                    └───────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`]: TOML configuration and built-in substitution tables
//! - [`aggregator`]: Per-player and global state for one run
//! - [`storm`]: Temporal storm pairing and fallback reasoning
//! - [`narrative`]: Template-based text generation
//! - [`cursor`]: Resume cursor and time-range bounds
//! - [`source`]: Line-oriented log input
//! - [`output`]: Section assembly and truncation

pub mod aggregator;
pub mod config;
pub mod cursor;
pub mod narrative;
pub mod output;
pub mod source;
pub mod storm;

// Re-export config types
pub use config::{
    default_config_toml, ConfigError, MaterialConfig, NarratorConfig, OutputConfig,
    DEFAULT_ENEMY_SUBSTITUTIONS, DEFAULT_LARGE_QUANTITY_THRESHOLD, DEFAULT_MATERIALS,
    DEFAULT_MESSAGE_SUBSTITUTIONS,
};

// Re-export aggregation types
pub use aggregator::{AggregationState, ChunkObservation, EventAggregator, PlayerRecord};

// Re-export storm types
pub use storm::{StormFallback, StormInterval, StormOutlook, StormTracker};

// Re-export narrative types
pub use narrative::{grammatical_join, top_ranked, NarrativeGenerator, OutputTemplates};

// Re-export cursor types
pub use cursor::{net_new_chunks, RunCursor, TimeRange, TimeRangeError, TimeUnit};

// Re-export input and output types
pub use output::{compose_sections, truncate_summary, RunSummary};
pub use source::LogSource;

use std::path::Path;
use thiserror::Error;

use log_events::LogTimestamp;

/// Errors that can occur in Narrator operations.
#[derive(Debug, Error)]
pub enum NarratorError {
    /// Error loading configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Runs summarization passes with one configuration.
#[derive(Debug, Clone)]
pub struct Narrator {
    /// Configuration settings
    config: NarratorConfig,
    /// Text generator built from the configured templates
    generator: NarrativeGenerator,
}

impl Narrator {
    /// Creates a new Narrator with the given configuration.
    pub fn new(config: NarratorConfig) -> Self {
        let generator = NarrativeGenerator::new(config.templates.clone(), config.output.brief);
        Self { config, generator }
    }

    /// Creates a Narrator from a configuration file.
    pub fn from_config_file(path: &Path) -> Result<Self, NarratorError> {
        let config = NarratorConfig::from_file(path)?;
        Ok(Self::new(config))
    }

    /// Creates a Narrator with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(NarratorConfig::default())
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }

    /// The configured time range, if it parses.
    pub fn time_range(&self) -> Option<TimeRange> {
        let raw = self.config.output.time_range.as_deref()?;
        match raw.parse() {
            Ok(range) => Some(range),
            Err(e) => {
                tracing::warn!(time_range = raw, error = %e, "ignoring time range");
                None
            }
        }
    }

    /// Summarizes everything in `sources` newer than `cursor`.
    ///
    /// Sources are replayed in the order given; each is expected to be
    /// chronological internally.
    pub fn run(&self, sources: &[LogSource], cursor: &RunCursor) -> RunSummary {
        let time_range = self.time_range();
        let lower_bound = self.lower_bound(sources, cursor, time_range.as_ref());
        let window = RunCursor::new(lower_bound, cursor.last_chunk_count);

        let mut aggregator = EventAggregator::new(&self.config);
        let mut max_processed: Option<LogTimestamp> = None;

        for source in sources {
            let before = aggregator.events_processed();
            for event in source.events().filter(|e| window.admits(e.timestamp)) {
                max_processed = max_processed.max(Some(event.timestamp));
                aggregator.process_event(&event);
            }
            tracing::debug!(
                source = %source.name,
                lines = source.lines.len(),
                events = aggregator.events_processed() - before,
                "processed log"
            );
        }

        let events_processed = aggregator.events_processed();
        let state = aggregator.into_state();

        // No chunk report this run means the map did not grow as far as we know
        let chunk_counter = state
            .chunks
            .map_or(cursor.last_chunk_count, |observed| observed.count);
        let new_chunks = net_new_chunks(cursor.last_chunk_count, chunk_counter);

        let preamble = time_range.map(|range| range.preamble());
        let text = self.render(&state, new_chunks, preamble.as_deref());

        tracing::info!(
            events = events_processed,
            players = state.players.len(),
            new_chunks,
            "summarized run"
        );

        RunSummary {
            text,
            next_cursor: cursor.advance(max_processed, chunk_counter),
            new_chunks,
            events_processed,
        }
    }

    /// Renders aggregated state into the final summary text.
    pub fn render(&self, state: &AggregationState, new_chunks: u64, preamble: Option<&str>) -> String {
        let story = self.generator.story(&state.players);
        let storms = self.generator.storm_summary(&state.storms.outlook());
        let chunks = self.generator.chunk_summary(new_chunks);

        let full = compose_sections([
            preamble.unwrap_or(""),
            story.as_str(),
            storms.as_str(),
            chunks.as_str(),
        ]);
        truncate_summary(&full, self.config.output.char_limit)
    }

    fn lower_bound(
        &self,
        sources: &[LogSource],
        cursor: &RunCursor,
        time_range: Option<&TimeRange>,
    ) -> Option<LogTimestamp> {
        let Some(range) = time_range else {
            return cursor.last_timestamp;
        };

        match sources.iter().filter_map(LogSource::max_timestamp).max() {
            Some(newest) => {
                let bound = range.bound(cursor.last_timestamp, newest);
                tracing::info!(
                    range = %range,
                    newest = %newest,
                    bound = ?bound.map(|b| b.to_string()),
                    "applying time range"
                );
                bound
            }
            None => {
                tracing::warn!(range = %range, "no timestamped lines; ignoring time range");
                cursor.last_timestamp
            }
        }
    }
}

impl Default for Narrator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ts(s: &str) -> LogTimestamp {
        s.parse().unwrap()
    }

    fn source(text: &str) -> LogSource {
        LogSource::from_text("server-audit.log", text)
    }

    #[test]
    fn test_bob_falls() {
        let narrator = Narrator::with_defaults();
        let summary = narrator.run(
            &[source(
                "12.05.2024 10:00:00 [Audit] Player Bob died. Death message: fell from a high place.",
            )],
            &RunCursor::default(),
        );

        assert_eq!(summary.text, "**Bob** died to falling.");
        assert_eq!(summary.next_cursor.last_timestamp, Some(ts("12.05.2024 10:00:00")));
        assert_eq!(summary.events_processed, 1);
    }

    #[test]
    fn test_braces_in_player_name_survive_rendering() {
        let narrator = Narrator::with_defaults();
        let summary = narrator.run(
            &[source("12.05.2024 10:00:00 [Audit] Player {phrases} died")],
            &RunCursor::default(),
        );
        assert_eq!(summary.text, "**{phrases}** died to unknown causes.");
    }

    #[test]
    fn test_nothing_happens() {
        let narrator = Narrator::with_defaults();
        let summary = narrator.run(
            &[source("12.05.2024 10:00:00 [Notification] Server is saving")],
            &RunCursor::default(),
        );
        assert_eq!(summary.text, "Nothing ever happens.");
    }

    #[test]
    fn test_cursor_excludes_equal_timestamp() {
        let narrator = Narrator::with_defaults();
        let cursor = RunCursor::new(Some(ts("12.05.2024 10:00:00")), 0);
        let summary = narrator.run(
            &[source("12.05.2024 10:00:00 [Audit] Player Bob died.")],
            &cursor,
        );

        assert_eq!(summary.text, "Nothing ever happens.");
        assert_eq!(summary.events_processed, 0);
        assert_eq!(summary.next_cursor, cursor);
    }

    #[test]
    fn test_chunks_without_report_keep_prior_count() {
        let narrator = Narrator::with_defaults();
        let summary = narrator.run(&[source("")], &RunCursor::new(None, 500));
        assert_eq!(summary.new_chunks, 0);
        assert_eq!(summary.next_cursor.last_chunk_count, 500);
    }

    #[test]
    fn test_chunk_rollback_is_clamped() {
        let narrator = Narrator::with_defaults();
        let summary = narrator.run(
            &[source("12.05.2024 10:00:00 [Event] Offthread save of 480 map chunks done.")],
            &RunCursor::new(None, 500),
        );
        assert_eq!(summary.new_chunks, 0);
        assert_eq!(summary.next_cursor.last_chunk_count, 500);
        assert_eq!(summary.text, "Nothing ever happens.");
    }

    #[test]
    fn test_time_range_bounds_events_and_adds_preamble() {
        let mut config = NarratorConfig::default();
        config.output.time_range = Some("1h".to_string());
        let narrator = Narrator::new(config);

        let summary = narrator.run(
            &[source(
                "12.05.2024 08:00:00 [Audit] Player Ann died.\n\
                 12.05.2024 10:00:00 [Audit] Player Bob died. Death message: fell from a high place.",
            )],
            &RunCursor::default(),
        );

        assert_eq!(summary.text, "In the last 1 hour(s)...\n**Bob** died to falling.");
        assert_eq!(summary.next_cursor.last_timestamp, Some(ts("12.05.2024 10:00:00")));
    }

    #[test]
    fn test_invalid_time_range_is_ignored() {
        let mut config = NarratorConfig::default();
        config.output.time_range = Some("soon".to_string());
        let narrator = Narrator::new(config);

        assert_eq!(narrator.time_range(), None);
        let summary = narrator.run(
            &[source("12.05.2024 08:00:00 [Audit] Player Ann died.")],
            &RunCursor::default(),
        );
        assert_eq!(summary.text, "**Ann** died to unknown causes.");
    }

    #[test]
    fn test_char_limit_truncates() {
        let mut config = NarratorConfig::default();
        config.output.char_limit = 10;
        let narrator = Narrator::new(config);

        let summary = narrator.run(&[], &RunCursor::default());
        assert_eq!(summary.text, "Nothing...");
    }

    #[test]
    fn test_from_config_file_missing() {
        let err = Narrator::from_config_file(Path::new("/nonexistent/narrator.toml")).unwrap_err();
        assert!(matches!(err, NarratorError::Config(ConfigError::IoError(_))));
    }
}
