//! Line-oriented log input.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log_events::{LogEvent, LogTimestamp};

/// The lines of one log file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSource {
    /// Display name used in diagnostics, usually the path
    pub name: String,
    /// Raw lines without terminators
    pub lines: Vec<String>,
}

impl LogSource {
    /// Creates a source from in-memory text.
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Reads all lines from `reader`.
    ///
    /// Invalid UTF-8 is replaced rather than rejected. A read error stops the
    /// file but keeps the lines read before it.
    pub fn from_reader<R: BufRead>(name: impl Into<String>, mut reader: R) -> Self {
        let name = name.into();
        let mut lines = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    lines.push(line.trim_end_matches(['\n', '\r']).to_string());
                }
                Err(e) => {
                    tracing::warn!(source = %name, error = %e, read = lines.len(), "stopped reading log");
                    break;
                }
            }
        }

        Self { name, lines }
    }

    /// Opens and reads a log file.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(path.display().to_string(), BufReader::new(file)))
    }

    /// Parses every line, skipping those without a leading timestamp.
    pub fn events(&self) -> impl Iterator<Item = LogEvent> + '_ {
        self.lines.iter().filter_map(|line| LogEvent::from_line(line))
    }

    /// Newest timestamp on any parseable line.
    pub fn max_timestamp(&self) -> Option<LogTimestamp> {
        self.events().map(|e| e.timestamp).max()
    }
}
