//! Text normalization for free-text log messages.
//!
//! Substitutions are literal substring replacements applied in table order.
//! Each rule sees the output of the rules before it, so a later rule may
//! rewrite text an earlier rule introduced. Matching is not word-bounded:
//! a short pattern can hit inside a longer word.

use serde::{Deserialize, Serialize};

use crate::patterns;

/// Cause used when a death message carries no usable text.
pub const UNKNOWN_CAUSE: &str = "unknown causes";

/// One literal `pattern -> replacement` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

impl Substitution {
    /// Creates a new substitution rule.
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Ordered list of substitution rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubstitutionTable {
    rules: Vec<Substitution>,
}

impl SubstitutionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(pattern, replacement)` pairs, keeping their order.
    pub fn from_pairs<I, P, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        Self {
            rules: pairs
                .into_iter()
                .map(|(p, r)| Substitution::new(p, r))
                .collect(),
        }
    }

    /// Sets the replacement for `pattern`.
    ///
    /// An existing rule keeps its position; a new one is appended.
    pub fn insert(&mut self, rule: Substitution) {
        match self.rules.iter_mut().find(|r| r.pattern == rule.pattern) {
            Some(existing) => existing.replacement = rule.replacement,
            None => self.rules.push(rule),
        }
    }

    /// Layers `overrides` on top of this table with [`insert`](Self::insert) semantics.
    pub fn merge(&mut self, overrides: impl IntoIterator<Item = Substitution>) {
        for rule in overrides {
            self.insert(rule);
        }
    }

    /// Applies every rule in order.
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();
        for rule in &self.rules {
            if rule.pattern.is_empty() {
                continue;
            }
            result = result.replace(&rule.pattern, &rule.replacement);
        }
        result
    }

    /// Returns the rules in application order.
    pub fn rules(&self) -> &[Substitution] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Substitution> for SubstitutionTable {
    fn from_iter<T: IntoIterator<Item = Substitution>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

/// Applies `mapping` to `text`. Used for enemy names and death causes alike.
pub fn apply_mapping(text: &str, mapping: &SubstitutionTable) -> String {
    mapping.apply(text)
}

/// Reduces a raw death message to a short cause phrase.
///
/// Strips a leading `player <name>` and a leading `got killed by` / `died`,
/// drops trailing periods, then applies `mapping`. Never returns an empty
/// string: blank causes and a bare `died` become [`UNKNOWN_CAUSE`].
pub fn clean_death_message(message: &str, player: &str, mapping: &SubstitutionTable) -> String {
    let text = patterns::strip_player_prefix(message, player).trim();
    let text = patterns::strip_death_prefix(text).trim();
    let text = text.trim_end_matches('.').trim();
    let cleaned = mapping.apply(text);

    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("died") {
        UNKNOWN_CAUSE.to_string()
    } else {
        cleaned
    }
}
