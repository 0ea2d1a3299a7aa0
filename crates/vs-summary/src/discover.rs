//! Log file discovery.

use glob::glob;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Finds files under `root` matching `pattern`, in sorted order.
///
/// Entries that cannot be read while walking are skipped with a warning.
pub fn discover(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoverError> {
    let full = resolve_glob(root, pattern);
    let entries = glob(&full).map_err(|e| DiscoverError::Glob {
        pattern: full.clone(),
        source: e,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(path = %e.path().display(), error = %e.error(), "skipping unreadable entry");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();

    paths.sort();
    Ok(paths)
}

/// Joins `pattern` onto `root`.
///
/// Glob metacharacters in `root` are escaped so a directory named e.g.
/// `logs[1]` is taken literally.
pub fn resolve_glob(root: &Path, pattern: &str) -> String {
    let root = glob::Pattern::escape(&root.to_string_lossy());
    Path::new(&root).join(pattern).to_string_lossy().into_owned()
}
