//! Configuration loading for the Narrator.
//!
//! All settings are loaded from a TOML configuration file. Every section is
//! optional; anything left out keeps its built-in default and unknown keys
//! are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

use log_events::{Substitution, SubstitutionTable};

use crate::narrative::OutputTemplates;

/// Death-cause rewrites applied before rendering.
pub const DEFAULT_MESSAGE_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("fell from a high place", "falling"),
    ("burned to death", "burning to death"),
    ("drowned", "drowning"),
    ("got bitten to death", "getting bitten to death"),
    ("thought he could fly", "falling"),
    ("suffered a grizzly death", "a grizzly bear"),
    ("got pancaked", "falling rocks"),
    ("got horned to death", "horned animal"),
    ("got rammed to death", "getting rammed to death"),
    ("got trampled by a bighorn sheep", "sheep"),
    ("messed around with a boar", "boar"),
    ("was torn limb from limb", "getting torn apart"),
    ("was bitten to death", "getting bitten to death"),
    ("had a too close encounter with a wolf", "getting mauled by wolves"),
    ("was wolf bait", "being eaten by wolves"),
    ("unwisely poked a bear", "bear"),
    ("forgot to eat", "starvation"),
];

/// Entity codes rewritten to readable creature names.
pub const DEFAULT_ENEMY_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("game:drifter-normal", "normal drifter"),
    ("game:drifter-corrupt", "corrupted drifter"),
    ("game:drifter-deep", "deep drifter"),
    ("game:drifter-tainted", "tainted drifter"),
    ("game:shiver-surface", "surface shiver"),
    ("game:pig-wild-male", "wild boar"),
    ("game:pig-wild-female", "wild sow"),
    ("game:wolf-male", "male wolf"),
    ("game:wolf-female", "female wolf"),
    ("game:fox-male-red", "male fox"),
    ("game:bowtorn-surface", "surface bowtorn"),
    ("game:bowtorn-deep", "deep bowtorn"),
    ("game:chicken-roosterpoult", "young rooster"),
    ("game:bear-male-black", "male bear"),
    ("game:bear-female-black", "female bear"),
    ("game:salmon", "salmon"),
    ("game:chicken-henpoult", "chicken"),
    ("game:chicken-hen", "chicken"),
    ("game:chicken-rooster", "rooster"),
    ("game:deer-water-female-adult", "female deer"),
    ("game:deer-water-male-adult", "male deer"),
    ("game:deer-moose-male-adult", "male moose"),
    ("game:deer-moose-female-adult", "female moose"),
    ("game:raccoon-male", "male coon"),
    ("game:raccoon-female", "female coon"),
    ("game:hare-female-gold", "female gold hare"),
    ("game:hare-male-gold", "male gold hare"),
    ("game:hare-female-ashgrey", "female grey hare"),
    ("game:hare-male-ashgrey", "male grey hare"),
    ("game:fox-female-red", "female fox"),
    ("primitivesurvival:landcrab", "crab"),
];

/// Materials whose large transfers are worth a mention.
pub const DEFAULT_MATERIALS: &[&str] = &[
    "copper",
    "bismuth",
    "bronze",
    "gold",
    "lead",
    "silver",
    "cassiterite",
    "sphalerite",
    "zinc",
];

/// Quantity at or above which a single transfer counts as large.
pub const DEFAULT_LARGE_QUANTITY_THRESHOLD: u64 = 100;

/// Complete Narrator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarratorConfig {
    /// Rewrites for death causes, merged over the defaults
    #[serde(default = "default_message_substitutions", deserialize_with = "merge_message_substitutions")]
    pub message_substitutions: SubstitutionTable,
    /// Rewrites for kill targets, merged over the defaults
    #[serde(default = "default_enemy_substitutions", deserialize_with = "merge_enemy_substitutions")]
    pub enemy_substitutions: SubstitutionTable,
    /// Narrative templates
    #[serde(default)]
    pub templates: OutputTemplates,
    /// Large-transfer tracking
    #[serde(default)]
    pub materials: MaterialConfig,
    /// Rendering options
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            message_substitutions: default_message_substitutions(),
            enemy_substitutions: default_enemy_substitutions(),
            templates: OutputTemplates::default(),
            materials: MaterialConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl NarratorConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::TomlError)
    }

    /// Serializes the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSerializeError)
    }
}

/// Large-transfer tracking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    /// Lower-case material names looked for in audit messages
    pub tracked: Vec<String>,
    /// Minimum `<n>x` quantity for a transfer to count as large
    pub large_quantity_threshold: u64,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            tracked: DEFAULT_MATERIALS.iter().map(|m| m.to_string()).collect(),
            large_quantity_threshold: DEFAULT_LARGE_QUANTITY_THRESHOLD,
        }
    }
}

/// Rendering options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Render one terse line per player instead of prose
    pub brief: bool,
    /// Maximum summary length in characters, 0 for unlimited
    pub char_limit: usize,
    /// Only summarize this far back from the newest log line, e.g. `"2h"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
}

fn default_message_substitutions() -> SubstitutionTable {
    SubstitutionTable::from_pairs(DEFAULT_MESSAGE_SUBSTITUTIONS.iter().copied())
}

fn default_enemy_substitutions() -> SubstitutionTable {
    SubstitutionTable::from_pairs(DEFAULT_ENEMY_SUBSTITUTIONS.iter().copied())
}

fn merge_message_substitutions<'de, D>(deserializer: D) -> Result<SubstitutionTable, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = Vec::<Substitution>::deserialize(deserializer)?;
    let mut table = default_message_substitutions();
    table.merge(overrides);
    Ok(table)
}

fn merge_enemy_substitutions<'de, D>(deserializer: D) -> Result<SubstitutionTable, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = Vec::<Substitution>::deserialize(deserializer)?;
    let mut table = default_enemy_substitutions();
    table.merge(overrides);
    Ok(table)
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    IoError(#[source] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    TomlError(#[source] toml::de::Error),
    /// Error writing TOML config
    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[source] toml::ser::Error),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# vs-summary configuration
#
# Substitutions are literal substring rewrites applied in order. Entries here
# are layered over the built-in tables: a known pattern gets a new
# replacement, a new pattern is appended.
#
# [[message_substitutions]]
# pattern = "fell from a high place"
# replacement = "falling"
#
# [[enemy_substitutions]]
# pattern = "game:wolf-male"
# replacement = "male wolf"

[templates]
player_story = "**{player}** {phrases}."
single_death = "died to {causes}"
double_death = "got killed by {causes}"
multiple_deaths = "was undone **{count}** times by {causes}"
single_kill = "only got a single kill, namely {kills}"
double_kill = "managed two whole kills - {kills} ...please clap"
multiple_kills = "murdered **{count}** enemies, notably {kills}"
unscathed = "remained unscathed."
storm_occurred = "A **temporal storm** occurred, beginning at **{start}** and lasted for **{duration}** minutes."
storm_start = "[**WARNING**] A **temporal storm** is imminent [**WARNING**]"
storm_soon = "A **temporal storm** is approaching, expected to start at **{start}**."
storm_ending = "A **temporal storm** is ending at **{end}**."
no_events = "Nothing ever happens."
chunk_summary = "**{count}** new map chunk(s) were added."

[materials]
tracked = ["copper", "bismuth", "bronze", "gold", "lead", "silver", "cassiterite", "sphalerite", "zinc"]
large_quantity_threshold = 100

[output]
brief = false
char_limit = 0
# time_range = "2h"
"#
    .to_string()
}
