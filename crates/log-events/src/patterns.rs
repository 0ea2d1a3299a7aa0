//! Named text matchers.
//!
//! Every pattern the pipeline relies on lives here, compiled once and exposed
//! behind a small function so each can be tested on its own.

use regex::Regex;
use std::num::ParseIntError;
use std::sync::OnceLock;

fn timestamp_re() -> &'static Regex {
    static TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();
    TIMESTAMP_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2}\.\d{1,2}\.\d{4} \d{2}:\d{2}:\d{2})").expect("valid timestamp regex")
    })
}

fn category_re() -> &'static Regex {
    static CATEGORY_RE: OnceLock<Regex> = OnceLock::new();
    CATEGORY_RE.get_or_init(|| Regex::new(r"\[(.*?)\]").expect("valid category regex"))
}

fn quantity_re() -> &'static Regex {
    static QUANTITY_RE: OnceLock<Regex> = OnceLock::new();
    QUANTITY_RE.get_or_init(|| Regex::new(r"(\d+)x").expect("valid quantity regex"))
}

fn death_message_re() -> &'static Regex {
    static DEATH_MESSAGE_RE: OnceLock<Regex> = OnceLock::new();
    DEATH_MESSAGE_RE
        .get_or_init(|| Regex::new(r"(?i)death message:\s*(.*)").expect("valid death message regex"))
}

fn death_prefix_re() -> &'static Regex {
    static DEATH_PREFIX_RE: OnceLock<Regex> = OnceLock::new();
    DEATH_PREFIX_RE
        .get_or_init(|| Regex::new(r"(?i)^(got killed by|died)\s+").expect("valid death prefix regex"))
}

fn killed_re() -> &'static Regex {
    static KILLED_RE: OnceLock<Regex> = OnceLock::new();
    KILLED_RE.get_or_init(|| Regex::new(r"(?i)killed\s+").expect("valid killed regex"))
}

fn article_re() -> &'static Regex {
    static ARTICLE_RE: OnceLock<Regex> = OnceLock::new();
    ARTICLE_RE.get_or_init(|| Regex::new(r"(?i)^an?\s+").expect("valid article regex"))
}

fn kill_token_re() -> &'static Regex {
    static KILL_TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    KILL_TOKEN_RE.get_or_init(|| Regex::new(r"^[\w:.-]+").expect("valid kill token regex"))
}

fn offthread_chunks_re() -> &'static Regex {
    static OFFTHREAD_CHUNKS_RE: OnceLock<Regex> = OnceLock::new();
    OFFTHREAD_CHUNKS_RE.get_or_init(|| {
        Regex::new(r"(?i)^offthread save of (\d+)\s+map\s+chunks done")
            .expect("valid offthread chunks regex")
    })
}

/// Leading `DD.MM.YYYY HH:MM:SS` text of a line, without validating the date.
pub fn leading_timestamp(line: &str) -> Option<&str> {
    timestamp_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Contents of the first `[...]` token, trimmed.
pub fn bracketed_category(text: &str) -> Option<&str> {
    category_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// All `<integer>x` quantities in `text`. Tokens too large for `u64` are skipped.
pub fn quantities(text: &str) -> Vec<u64> {
    quantity_re()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Text following `death message:`, trimmed.
pub fn death_message(text: &str) -> Option<&str> {
    death_message_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Strips a leading `got killed by` / `died` followed by whitespace.
pub fn strip_death_prefix(text: &str) -> &str {
    match death_prefix_re().find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Strips a leading `player <name>` plus any following `: , -` or whitespace.
///
/// Requires at least one separator after the name, so `player Bobby` is left
/// untouched when the name is `Bob`.
pub fn strip_player_prefix<'a>(text: &'a str, player: &str) -> &'a str {
    let pattern = format!(r"(?i)^player\s+{}[\s:,-]+", regex::escape(player));
    match Regex::new(&pattern) {
        Ok(re) => match re.find(text) {
            Some(m) => &text[m.end()..],
            None => text,
        },
        Err(_) => text,
    }
}

/// Target of the first `killed <target>` phrase not of the form `killed by`.
///
/// An optional leading `a`/`an` article is skipped. The target token is made
/// of word characters plus `:`, `.` and `-`, which keeps entity codes such as
/// `game:wolf-male` intact.
pub fn kill_target(text: &str) -> Option<&str> {
    for m in killed_re().find_iter(text) {
        let rest = &text[m.end()..];
        if rest
            .get(..2)
            .is_some_and(|head| head.eq_ignore_ascii_case("by"))
        {
            continue;
        }

        let after_article = article_re().find(rest).map(|a| &rest[a.end()..]);
        let token = after_article
            .and_then(|tail| kill_token_re().find(tail))
            .or_else(|| kill_token_re().find(rest));
        if let Some(token) = token {
            return Some(token.as_str());
        }
    }
    None
}

/// Chunk count of an `offthread save of <N> map chunks done` message.
///
/// `None` when the message is something else; `Some(Err(_))` when it matches
/// but the digits do not fit the counter.
pub fn offthread_chunk_count(message: &str) -> Option<Result<u64, ParseIntError>> {
    offthread_chunks_re()
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().parse())
}
