//! Summary assembly.

use serde::{Deserialize, Serialize};

use crate::cursor::RunCursor;

/// Appended to a truncated summary.
pub const ELLIPSIS: &str = "...";

/// Result of one summarization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Rendered summary text
    pub text: String,
    /// Cursor to persist for the next run
    pub next_cursor: RunCursor,
    /// Map chunks added since the prior run
    pub new_chunks: u64,
    /// Events newer than the lower bound
    pub events_processed: usize,
}

/// Joins the non-empty sections with single newlines.
pub fn compose_sections<'a>(sections: impl IntoIterator<Item = &'a str>) -> String {
    sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cuts `text` to at most `limit` characters.
///
/// A limit of 0 means unlimited. Above 3 the last three characters are an
/// ellipsis; at 3 or below the text is cut bare.
pub fn truncate_summary(text: &str, limit: usize) -> String {
    if limit == 0 || text.chars().count() <= limit {
        return text.to_string();
    }

    if limit > ELLIPSIS.len() {
        let kept: String = text.chars().take(limit - ELLIPSIS.len()).collect();
        format!("{kept}{ELLIPSIS}")
    } else {
        text.chars().take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_skips_empty_sections() {
        assert_eq!(compose_sections(["a", "", "b", ""]), "a\nb");
        assert_eq!(compose_sections([]), "");
    }

    #[test]
    fn test_truncate_unlimited() {
        assert_eq!(truncate_summary("hello world", 0), "hello world");
        assert_eq!(truncate_summary("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        let out = truncate_summary("hello world", 8);
        assert_eq!(out, "hello...");
        assert_eq!(out.chars().count(), 8);
    }

    #[test]
    fn test_truncate_tiny_limit() {
        assert_eq!(truncate_summary("hello", 3), "hel");
        assert_eq!(truncate_summary("hello", 1), "h");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_summary("ääääää", 5), "ää...");
    }
}
