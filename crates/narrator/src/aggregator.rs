//! Event aggregation.
//!
//! Consumes the ordered event stream of one run, classifies each event and
//! accumulates per-player records plus the global storm and chunk state.

use std::collections::{BTreeMap, BTreeSet};

use log_events::{clean_death_message, patterns, Category, LogEvent, LogTimestamp, SubstitutionTable};
use serde::{Deserialize, Serialize};

use crate::config::NarratorConfig;
use crate::storm::StormTracker;

const TRANSFER_VERBS: [&str; 3] = ["moved", "took", "put"];

/// Everything one player did during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Cleaned death causes, in processing order
    pub deaths: Vec<String>,
    /// Normalized kill targets, in processing order
    pub kills: Vec<String>,
    /// Tracked materials moved in large quantities
    pub large_materials: BTreeSet<String>,
}

impl PlayerRecord {
    /// Returns true if the player died or killed something.
    pub fn has_combat(&self) -> bool {
        !self.deaths.is_empty() || !self.kills.is_empty()
    }
}

/// The most recent chunk-save report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkObservation {
    /// Cumulative chunk count reported by the server
    pub count: u64,
    /// When the report was logged
    pub observed_at: LogTimestamp,
}

/// Aggregated state of one run.
#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    /// Player records keyed by lower-cased name, in sorted order
    pub players: BTreeMap<String, PlayerRecord>,
    /// Raw storm notifications
    pub storms: StormTracker,
    /// Newest chunk-save report, by timestamp
    pub chunks: Option<ChunkObservation>,
}

impl AggregationState {
    fn player_mut(&mut self, name: &str) -> &mut PlayerRecord {
        self.players.entry(name.to_lowercase()).or_default()
    }
}

/// Extracts the acting player from an audit message.
///
/// The first word names the player unless it is `player` or `client`
/// (optionally colon-suffixed), in which case the second word does.
pub fn extract_player_name(message: &str) -> Option<&str> {
    let mut tokens = message.split_whitespace();
    let first = tokens.next()?;
    let marker = first.trim_matches(':').to_lowercase();
    if marker == "player" || marker == "client" {
        Some(tokens.next().unwrap_or(first))
    } else {
        Some(first)
    }
}

/// Returns true if a lower-cased audit message mentions a death, a kill or a spreading fire.
pub fn is_interesting_audit(lower_message: &str) -> bool {
    lower_message.contains("died")
        || lower_message.contains("death message")
        || lower_message.contains("killed")
        || (lower_message.contains("fire") && lower_message.contains("spread"))
}

fn mentions_transfer(lower_message: &str) -> bool {
    TRANSFER_VERBS.iter().any(|verb| lower_message.contains(verb))
}

/// Classifies events and accumulates an [`AggregationState`].
#[derive(Debug, Clone)]
pub struct EventAggregator {
    /// Death-cause rewrites
    message_substitutions: SubstitutionTable,
    /// Kill-target rewrites
    enemy_substitutions: SubstitutionTable,
    /// Lower-cased tracked material names
    materials: Vec<String>,
    /// Minimum quantity for a large transfer
    large_quantity_threshold: u64,
    /// Accumulated state
    state: AggregationState,
    /// Number of events consumed
    events_processed: usize,
}

impl EventAggregator {
    /// Creates an aggregator with the given configuration.
    pub fn new(config: &NarratorConfig) -> Self {
        Self {
            message_substitutions: config.message_substitutions.clone(),
            enemy_substitutions: config.enemy_substitutions.clone(),
            materials: config
                .materials
                .tracked
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            large_quantity_threshold: config.materials.large_quantity_threshold,
            state: AggregationState::default(),
            events_processed: 0,
        }
    }

    /// Creates an aggregator with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(&NarratorConfig::default())
    }

    /// Consumes one event.
    ///
    /// The caller is responsible for skipping events at or before the cursor.
    pub fn process_event(&mut self, event: &LogEvent) {
        self.events_processed += 1;
        let lower = event.lower_message();

        match event.category {
            Category::Audit => {
                let tracked_transfer = self.mentions_tracked_material(&lower) && mentions_transfer(&lower);
                if is_interesting_audit(&lower) || tracked_transfer {
                    self.process_audit(&event.message, &lower);
                }
            }
            Category::Notification => {
                if StormTracker::is_storm_message(&lower) {
                    self.state.storms.record(event.clone());
                }
            }
            Category::Event => self.process_chunk_report(event),
            Category::Other(_) => {}
        }
    }

    /// Consumes a sequence of events in order.
    pub fn process_events<'a>(&mut self, events: impl IntoIterator<Item = &'a LogEvent>) {
        for event in events {
            self.process_event(event);
        }
    }

    fn mentions_tracked_material(&self, lower_message: &str) -> bool {
        self.materials.iter().any(|m| lower_message.contains(m.as_str()))
    }

    fn process_audit(&mut self, message: &str, lower_message: &str) {
        let Some(player) = extract_player_name(message) else {
            return;
        };
        // A bare "Player" with nothing after it is not a name
        if player.eq_ignore_ascii_case("player") {
            return;
        }

        if lower_message.contains("died") || lower_message.contains("death message") {
            let cause_text = patterns::death_message(message).unwrap_or(message);
            let cause = clean_death_message(cause_text, player, &self.message_substitutions);
            tracing::debug!(player, cause = %cause, "recorded death");
            self.state.player_mut(player).deaths.push(cause);
        }

        if lower_message.contains("killed") {
            if let Some(target) = patterns::kill_target(message) {
                let enemy = self.enemy_substitutions.apply(target);
                let enemy = self.message_substitutions.apply(&enemy);
                tracing::debug!(player, enemy = %enemy, "recorded kill");
                self.state.player_mut(player).kills.push(enemy);
            }
        }

        if mentions_transfer(lower_message) {
            let largest = patterns::quantities(message).into_iter().max();
            let is_large = largest.is_some_and(|q| q >= self.large_quantity_threshold);
            if is_large {
                let moved: Vec<String> = self
                    .materials
                    .iter()
                    .filter(|m| lower_message.contains(m.as_str()))
                    .cloned()
                    .collect();
                if !moved.is_empty() {
                    self.state.player_mut(player).large_materials.extend(moved);
                }
            }
        }
    }

    fn process_chunk_report(&mut self, event: &LogEvent) {
        let Some(parsed) = patterns::offthread_chunk_count(&event.message) else {
            return;
        };

        let count = match parsed {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(message = %event.message, error = %e, "could not parse chunk count");
                return;
            }
        };

        // Last writer by timestamp wins, not last processed
        let is_newer = self
            .state
            .chunks
            .map_or(true, |seen| event.timestamp > seen.observed_at);
        if is_newer {
            self.state.chunks = Some(ChunkObservation {
                count,
                observed_at: event.timestamp,
            });
        }
    }

    /// Returns the accumulated state.
    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    /// Consumes the aggregator, returning its state.
    pub fn into_state(self) -> AggregationState {
        self.state
    }

    /// Returns the number of events consumed.
    pub fn events_processed(&self) -> usize {
        self.events_processed
    }
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(time: &str, category: &str, message: &str) -> LogEvent {
        LogEvent::new(
            format!("12.05.2024 {time}").parse().unwrap(),
            category,
            message,
        )
    }

    fn audit(message: &str) -> LogEvent {
        event("10:00:00", "Audit", message)
    }

    fn chunk(time: &str, count: u64) -> LogEvent {
        event(
            time,
            "Event",
            &format!("Offthread save of {count} map chunks done."),
        )
    }

    #[test]
    fn test_extract_player_name() {
        assert_eq!(extract_player_name("Player Bob died"), Some("Bob"));
        assert_eq!(extract_player_name("Client: Ann killed x"), Some("Ann"));
        assert_eq!(extract_player_name("Bob killed x"), Some("Bob"));
        assert_eq!(extract_player_name("player"), Some("player"));
        assert_eq!(extract_player_name("   "), None);
    }

    #[test]
    fn test_is_interesting_audit() {
        assert!(is_interesting_audit("bob died"));
        assert!(is_interesting_audit("death message: x"));
        assert!(is_interesting_audit("bob killed a wolf"));
        assert!(is_interesting_audit("fire did spread"));
        assert!(!is_interesting_audit("fire was lit"));
        assert!(!is_interesting_audit("bob placed a block"));
    }

    #[test]
    fn test_death_with_death_message() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&audit(
            "Player Bob died. Death message: fell from a high place.",
        ));

        let players = &aggregator.state().players;
        assert_eq!(players["bob"].deaths, vec!["falling"]);
        assert!(players["bob"].kills.is_empty());
    }

    #[test]
    fn test_death_without_death_message() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&audit("Player Bob died"));

        assert_eq!(aggregator.state().players["bob"].deaths, vec!["unknown causes"]);
    }

    #[test]
    fn test_player_names_are_case_insensitive() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&audit("Player Bob died"));
        aggregator.process_event(&audit("Player BOB died"));

        let players = &aggregator.state().players;
        assert_eq!(players.len(), 1);
        assert_eq!(players["bob"].deaths.len(), 2);
    }

    #[test]
    fn test_bare_player_is_skipped() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&audit("Client player died"));
        aggregator.process_event(&audit("Player PLAYER killed a wolf"));

        assert!(aggregator.state().players.is_empty());
    }

    #[test]
    fn test_kill_is_normalized() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&audit("Player Ann killed game:wolf-male"));
        aggregator.process_event(&audit("Player Ann killed a game:hare-female-gold"));

        assert_eq!(
            aggregator.state().players["ann"].kills,
            vec!["male wolf", "female gold hare"]
        );
    }

    #[test]
    fn test_kill_goes_through_both_tables() {
        let mut config = NarratorConfig::default();
        config.enemy_substitutions = SubstitutionTable::from_pairs([("game:x", "drowned thing")]);
        let mut aggregator = EventAggregator::new(&config);
        aggregator.process_event(&audit("Ann killed game:x"));

        assert_eq!(aggregator.state().players["ann"].kills, vec!["drowning thing"]);
    }

    #[test]
    fn test_killed_by_records_no_kill() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&audit("Player Ann got killed by a wolf"));

        assert!(aggregator.state().players.is_empty());
    }

    #[test]
    fn test_large_material_transfer() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&audit("Ann moved 150x ingot-copper and 3x ingot-gold"));
        aggregator.process_event(&audit("Ann took 200x ingot-copper"));

        let record = &aggregator.state().players["ann"];
        let materials: Vec<_> = record.large_materials.iter().cloned().collect();
        assert_eq!(materials, vec!["copper", "gold"]);
        assert!(!record.has_combat());
    }

    #[test]
    fn test_small_material_transfer_is_ignored() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&audit("Ann moved 99x ingot-copper"));
        aggregator.process_event(&audit("Ann moved lots of copper"));

        assert!(aggregator.state().players.is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&audit("Ann put 100x nugget-silver into chest"));

        assert!(aggregator.state().players["ann"].large_materials.contains("silver"));
    }

    #[test]
    fn test_non_audit_deaths_are_ignored() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&event("10:00:00", "Chat", "Player Bob died"));

        assert!(aggregator.state().players.is_empty());
        assert_eq!(aggregator.events_processed(), 1);
    }

    #[test]
    fn test_storm_notifications_are_recorded() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&event("10:00:00", "Notification", "A temporal storm is imminent"));
        aggregator.process_event(&event("10:01:00", "Notification", "Server restarting"));
        aggregator.process_event(&event("10:02:00", "Audit", "temporal storm is imminent"));

        assert_eq!(aggregator.state().storms.len(), 1);
    }

    #[test]
    fn test_chunk_counter_later_timestamp_wins() {
        let mut in_order = EventAggregator::with_defaults();
        in_order.process_event(&chunk("10:00:00", 100));
        in_order.process_event(&chunk("11:00:00", 250));

        let mut reversed = EventAggregator::with_defaults();
        reversed.process_event(&chunk("11:00:00", 250));
        reversed.process_event(&chunk("10:00:00", 100));

        for aggregator in [in_order, reversed] {
            let chunks = aggregator.state().chunks.unwrap();
            assert_eq!(chunks.count, 250);
            assert_eq!(chunks.observed_at.to_string(), "12.05.2024 11:00:00");
        }
    }

    #[test]
    fn test_chunk_counter_same_timestamp_keeps_first_seen() {
        // Ties are order-dependent: the first event at a timestamp is kept
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&chunk("10:00:00", 100));
        aggregator.process_event(&chunk("10:00:00", 300));

        assert_eq!(aggregator.state().chunks.unwrap().count, 100);
    }

    #[test]
    fn test_chunk_counter_bad_digits_are_skipped() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&event(
            "10:00:00",
            "Event",
            "Offthread save of 99999999999999999999999 map chunks done",
        ));

        assert!(aggregator.state().chunks.is_none());
    }

    #[test]
    fn test_chunk_message_must_lead() {
        let mut aggregator = EventAggregator::with_defaults();
        aggregator.process_event(&event(
            "10:00:00",
            "Event",
            "Note: offthread save of 5 map chunks done",
        ));

        assert!(aggregator.state().chunks.is_none());
    }
}
