//! Persisted run cursor.
//!
//! The state file is a small JSON object:
//! `{"last_timestamp": "DD.MM.YYYY HH:MM:SS", "last_chunk_count": N}`.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use narrator::RunCursor;

/// Loads the cursor, falling back to an empty one.
///
/// A missing file is normal on the first run. Anything unreadable or
/// malformed is reported and treated as no cursor at all.
pub fn load_cursor(path: &Path) -> RunCursor {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "state file not found; processing all messages");
            return RunCursor::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read state file; processing all messages");
            return RunCursor::default();
        }
    };

    match serde_json::from_str::<RunCursor>(&content) {
        Ok(cursor) => {
            tracing::debug!(
                last_timestamp = ?cursor.last_timestamp.map(|t| t.to_string()),
                last_chunk_count = cursor.last_chunk_count,
                "loaded state"
            );
            cursor
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "state file is malformed; processing all messages");
            RunCursor::default()
        }
    }
}

/// Writes the cursor as JSON.
pub fn save_cursor(path: &Path, cursor: &RunCursor) -> Result<()> {
    let json = serde_json::to_string_pretty(cursor).context("serializing state")?;
    fs::write(path, json).with_context(|| format!("writing state file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "saved state");
    Ok(())
}

/// Removes the state file if it exists.
pub fn delete_state(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "state file deleted for reset");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("deleting state file {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_cursor() {
        let dir = tempdir().unwrap();
        assert_eq!(load_cursor(&dir.path().join("state.json")), RunCursor::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let cursor = RunCursor::new(Some("12.05.2024 10:00:00".parse().unwrap()), 1250);

        save_cursor(&path, &cursor).unwrap();
        assert_eq!(load_cursor(&path), cursor);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"last_timestamp\": \"12.05.2024 10:00:00\""));
        assert!(raw.contains("\"last_chunk_count\": 1250"));
    }

    #[test]
    fn test_reads_hand_written_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"last_timestamp": "01.06.2024 23:59:59", "last_chunk_count": 42}"#).unwrap();

        let cursor = load_cursor(&path);
        assert_eq!(cursor.last_chunk_count, 42);
        assert_eq!(
            cursor.last_timestamp.map(|t| t.to_string()).as_deref(),
            Some("01.06.2024 23:59:59")
        );
    }

    #[test]
    fn test_corrupt_state_resets_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        fs::write(&path, "not json").unwrap();
        assert_eq!(load_cursor(&path), RunCursor::default());

        fs::write(&path, r#"{"last_timestamp": "yesterday", "last_chunk_count": 42}"#).unwrap();
        assert_eq!(load_cursor(&path), RunCursor::default());
    }

    #[test]
    fn test_delete_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        delete_state(&path).unwrap();
        fs::write(&path, "{}").unwrap();
        delete_state(&path).unwrap();
        assert!(!path.exists());
    }
}
