//! Template-based narrative generation.
//!
//! Renders an aggregated run into prose. Rendering is deterministic: the
//! same state and templates always produce the same text.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::aggregator::PlayerRecord;
use crate::storm::StormOutlook;

/// How many distinct causes or targets a multi-event phrase names.
pub const TOP_RANKED: usize = 3;

/// Narrative templates, one per recognized key.
///
/// Placeholders are `{name}` markers replaced literally. Keys left out of a
/// configuration file keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputTemplates {
    /// Wraps one player's line: `{player}`, `{phrases}`
    pub player_story: String,
    /// One death: `{causes}`
    pub single_death: String,
    /// Two deaths: `{causes}`
    pub double_death: String,
    /// Three or more deaths: `{count}`, `{causes}`
    pub multiple_deaths: String,
    /// One kill: `{kills}`
    pub single_kill: String,
    /// Two kills: `{kills}`
    pub double_kill: String,
    /// Three or more kills: `{count}`, `{kills}`
    pub multiple_kills: String,
    /// Accepted for compatibility; no section currently renders it
    pub unscathed: String,
    /// A storm with known start and length: `{start}`, `{duration}`
    pub storm_occurred: String,
    /// A storm started with no end seen
    pub storm_start: String,
    /// Only the early warning was seen: `{start}`
    pub storm_soon: String,
    /// Only the end was seen: `{end}`
    pub storm_ending: String,
    /// Whole story section when no player did anything
    pub no_events: String,
    /// New map chunks: `{count}`
    pub chunk_summary: String,
}

impl Default for OutputTemplates {
    fn default() -> Self {
        Self {
            player_story: "**{player}** {phrases}.".to_string(),
            single_death: "died to {causes}".to_string(),
            double_death: "got killed by {causes}".to_string(),
            multiple_deaths: "was undone **{count}** times by {causes}".to_string(),
            single_kill: "only got a single kill, namely {kills}".to_string(),
            double_kill: "managed two whole kills - {kills} ...please clap".to_string(),
            multiple_kills: "murdered **{count}** enemies, notably {kills}".to_string(),
            unscathed: "remained unscathed.".to_string(),
            storm_occurred: "A **temporal storm** occurred, beginning at **{start}** and lasted for **{duration}** minutes.".to_string(),
            storm_start: "[**WARNING**] A **temporal storm** is imminent [**WARNING**]".to_string(),
            storm_soon: "A **temporal storm** is approaching, expected to start at **{start}**.".to_string(),
            storm_ending: "A **temporal storm** is ending at **{end}**.".to_string(),
            no_events: "Nothing ever happens.".to_string(),
            chunk_summary: "**{count}** new map chunk(s) were added.".to_string(),
        }
    }
}

/// Replaces each `{key}` in `template` with its value.
///
/// The template is scanned once, so inserted values are never expanded
/// again. Unknown markers are kept verbatim.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let filled = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (close, *value))
        });

        match filled {
            Some((close, value)) => {
                result.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                result.push('{');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Joins items as natural-language prose: "A", "A and B", "A, B, and C".
pub fn grammatical_join<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{}, and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Returns up to `n` distinct items, most frequent first.
///
/// Items with equal counts keep the order in which they were first seen.
pub fn top_ranked(items: &[String], n: usize) -> Vec<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for item in items {
        let count = counts.entry(item.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(item.as_str());
        }
        *count += 1;
    }

    // Stable sort keeps first-seen order among ties
    first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));
    first_seen.truncate(n);
    first_seen
}

/// Capitalizes the first character of a player key.
pub fn display_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Per-kind templates for the count-tiered phrases.
struct Tiers<'a> {
    single: &'a str,
    double: &'a str,
    multiple: &'a str,
    placeholder: &'a str,
}

/// Renders aggregated state as narrative text.
#[derive(Debug, Clone)]
pub struct NarrativeGenerator {
    /// Templates for generating text
    templates: OutputTemplates,
    /// Render terse per-player counts instead of prose
    brief: bool,
}

impl NarrativeGenerator {
    /// Creates a new generator.
    pub fn new(templates: OutputTemplates, brief: bool) -> Self {
        Self { templates, brief }
    }

    /// Creates a generator with default templates in prose mode.
    pub fn with_defaults() -> Self {
        Self::new(OutputTemplates::default(), false)
    }

    /// Renders the story section: one line per player, sorted by key.
    pub fn story(&self, players: &BTreeMap<String, PlayerRecord>) -> String {
        if players.is_empty() {
            return self.templates.no_events.clone();
        }

        players
            .iter()
            .map(|(key, record)| self.player_story(key, record))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders one player's line.
    pub fn player_story(&self, key: &str, record: &PlayerRecord) -> String {
        let name = display_name(key);

        if self.brief {
            return if record.has_combat() {
                format!(
                    "**{}**: {} death(s), {} kill(s).",
                    name,
                    record.deaths.len(),
                    record.kills.len()
                )
            } else {
                format!("**{}**: unscathed.", name)
            };
        }

        let death_phrase = self.tiered_phrase(
            &record.deaths,
            Tiers {
                single: &self.templates.single_death,
                double: &self.templates.double_death,
                multiple: &self.templates.multiple_deaths,
                placeholder: "causes",
            },
        );
        let kill_phrase = self.tiered_phrase(
            &record.kills,
            Tiers {
                single: &self.templates.single_kill,
                double: &self.templates.double_kill,
                multiple: &self.templates.multiple_kills,
                placeholder: "kills",
            },
        );

        let phrases: Vec<&str> = [death_phrase.as_str(), kill_phrase.as_str()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        if phrases.is_empty() {
            // Material moves alone do not make a story
            return format!("**{}** did nothing", name);
        }

        let mut combined = phrases.join(" and ");
        if !record.large_materials.is_empty() {
            let materials: Vec<&String> = record.large_materials.iter().collect();
            combined = format!(
                "{}. They moved a large sum of {}",
                combined,
                grammatical_join(&materials)
            );
        }

        fill_template(
            &self.templates.player_story,
            &[("player", name.as_str()), ("phrases", combined.as_str())],
        )
    }

    fn tiered_phrase(&self, items: &[String], tiers: Tiers<'_>) -> String {
        match items.len() {
            0 => String::new(),
            1 => fill_template(tiers.single, &[(tiers.placeholder, grammatical_join(items).as_str())]),
            2 => fill_template(tiers.double, &[(tiers.placeholder, grammatical_join(items).as_str())]),
            count => {
                let top = grammatical_join(&top_ranked(items, TOP_RANKED));
                fill_template(
                    tiers.multiple,
                    &[("count", count.to_string().as_str()), (tiers.placeholder, top.as_str())],
                )
            }
        }
    }

    /// Renders the storm section; empty when there is nothing to say.
    pub fn storm_summary(&self, outlook: &StormOutlook) -> String {
        match outlook {
            StormOutlook::Several {
                count,
                average_minutes,
            } => format!(
                "{} temporal storms occurred, with an average duration of {} minutes",
                count, average_minutes
            ),
            StormOutlook::Occurred { start, minutes } => fill_template(
                &self.templates.storm_occurred,
                &[
                    ("start", start.time_of_day().as_str()),
                    ("duration", minutes.to_string().as_str()),
                ],
            ),
            StormOutlook::Imminent => self.templates.storm_start.clone(),
            StormOutlook::Approaching { at } => {
                fill_template(&self.templates.storm_soon, &[("start", at.time_of_day().as_str())])
            }
            StormOutlook::Ending { at } => {
                fill_template(&self.templates.storm_ending, &[("end", at.time_of_day().as_str())])
            }
            StormOutlook::Calm => String::new(),
        }
    }

    /// Renders the chunk section; empty when no new chunks were added.
    pub fn chunk_summary(&self, new_chunks: u64) -> String {
        if new_chunks == 0 {
            return String::new();
        }
        fill_template(
            &self.templates.chunk_summary,
            &[("count", new_chunks.to_string().as_str())],
        )
    }
}

impl Default for NarrativeGenerator {
    fn default() -> Self {
        Self::with_defaults()
    }
}
