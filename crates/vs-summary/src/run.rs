//! One end-to-end summarization run.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use narrator::{LogSource, Narrator, NarratorConfig, RunCursor, RunSummary};

use crate::cli::Args;
use crate::discover::discover;
use crate::state;

/// Loads the configuration file if given, then applies CLI overrides.
pub fn load_config(args: &Args) -> Result<NarratorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let config = NarratorConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?;
            tracing::info!(path = %path.display(), "configuration loaded");
            config
        }
        None => NarratorConfig::default(),
    };
    args.apply_overrides(&mut config);
    Ok(config)
}

/// Resolves the cursor this run starts from.
pub fn starting_cursor(args: &Args) -> Result<RunCursor> {
    if args.delete_state {
        state::delete_state(&args.state)?;
        return Ok(RunCursor::default());
    }

    let cursor = state::load_cursor(&args.state);
    if args.force_full {
        tracing::info!("force full search enabled; ignoring stored timestamp");
        return Ok(cursor.without_timestamp());
    }
    Ok(cursor)
}

/// Reads every discovered log, skipping files that cannot be opened.
pub fn read_sources(paths: &[PathBuf]) -> Vec<LogSource> {
    paths
        .iter()
        .filter_map(|path| match LogSource::from_path(path) {
            Ok(source) => Some(source),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "could not open log file; skipping");
                None
            }
        })
        .collect()
}

/// Writes the summary text, creating parent directories as needed.
pub fn write_summary(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("writing summary to {}", path.display()))
}

/// Runs discovery, summarization and persistence.
pub fn execute(args: &Args) -> Result<RunSummary> {
    let log_dir = args
        .log_dir
        .as_deref()
        .context("a log directory is required")?;

    let config = load_config(args)?;
    let cursor = starting_cursor(args)?;

    let paths = discover(log_dir, args.log_pattern())?;
    tracing::info!(dir = %log_dir.display(), files = paths.len(), "processing log files");
    let sources = read_sources(&paths);

    let narrator = Narrator::new(config);
    let summary = narrator.run(&sources, &cursor);

    write_summary(&args.output_file, &summary.text)?;
    state::save_cursor(&args.state, &summary.next_cursor)?;
    tracing::info!(path = %args.output_file.display(), "narrative summary written");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unopenable_log_is_skipped() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("server-audit.log");
        fs::write(
            &real,
            "12.05.2024 10:00:00 [Audit] Player Bob died. Death message: fell from a high place.\n",
        )
        .unwrap();
        let missing = dir.path().join("server-gone.log");

        let sources = read_sources(&[missing, real.clone()]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, real.display().to_string());

        let summary = Narrator::with_defaults().run(&sources, &RunCursor::default());
        assert_eq!(summary.text, "**Bob** died to falling.");
    }

    #[test]
    fn test_write_summary_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/summary.txt");

        write_summary(&path, "Nothing ever happens.").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Nothing ever happens.");
    }
}
