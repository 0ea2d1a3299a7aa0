//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

use narrator::NarratorConfig;

/// Command line arguments for the summarizer
#[derive(Parser, Debug, Clone)]
#[command(name = "vs-summary")]
#[command(about = "Parse game server logs and write a narrative summary of what happened")]
pub struct Args {
    /// Directory containing .log files
    #[arg(short = 'l', long, required_unless_present = "print_default_config")]
    pub log_dir: Option<PathBuf>,

    /// Where the summary is written
    #[arg(short = 'o', long, default_value = "summary.txt")]
    pub output_file: PathBuf,

    /// State file (JSON) holding the last timestamp and chunk count
    #[arg(short = 's', long, default_value = "state.json")]
    pub state: PathBuf,

    /// Search subdirectories for log files too
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Maximum characters in the summary (0 for no limit)
    #[arg(short = 'c', long)]
    pub char_limit: Option<usize>,

    /// Optional TOML configuration for substitutions, templates and output
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Ignore the stored timestamp and summarize everything
    #[arg(short = 'f', long)]
    pub force_full: bool,

    /// Delete the state file before processing
    #[arg(short = 'd', long)]
    pub delete_state: bool,

    /// Only summarize this far back from the newest log line (e.g. 30m, 2h, 1d)
    #[arg(short = 't', long)]
    pub time_range: Option<String>,

    /// One terse line per player
    #[arg(long)]
    pub brief: bool,

    /// Also print the summary to stdout
    #[arg(long)]
    pub stdout: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print the default configuration and exit
    #[arg(long)]
    pub print_default_config: bool,
}

impl Args {
    /// Layers command-line overrides onto a loaded configuration.
    pub fn apply_overrides(&self, config: &mut NarratorConfig) {
        if self.brief {
            config.output.brief = true;
        }
        if let Some(limit) = self.char_limit {
            config.output.char_limit = limit;
        }
        if let Some(range) = &self.time_range {
            config.output.time_range = Some(range.clone());
        }
    }

    /// Glob pattern for log files, relative to the log directory.
    pub fn log_pattern(&self) -> &'static str {
        if self.recursive {
            "**/*.log"
        } else {
            "*.log"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["vs-summary", "-l", "logs"]).unwrap();
        assert_eq!(args.log_dir, Some(PathBuf::from("logs")));
        assert_eq!(args.output_file, PathBuf::from("summary.txt"));
        assert_eq!(args.state, PathBuf::from("state.json"));
        assert!(!args.recursive);
        assert_eq!(args.char_limit, None);
        assert_eq!(args.log_pattern(), "*.log");
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "vs-summary", "-l", "logs", "-o", "out.txt", "-s", "s.json", "-r", "-c", "500", "-C",
            "vs.toml", "-f", "-d", "-t", "2h", "-v",
        ])
        .unwrap();

        assert!(args.recursive && args.force_full && args.delete_state && args.verbose);
        assert_eq!(args.char_limit, Some(500));
        assert_eq!(args.config, Some(PathBuf::from("vs.toml")));
        assert_eq!(args.time_range.as_deref(), Some("2h"));
        assert_eq!(args.log_pattern(), "**/*.log");
    }

    #[test]
    fn test_log_dir_required() {
        assert!(Args::try_parse_from(["vs-summary"]).is_err());
        assert!(Args::try_parse_from(["vs-summary", "--print-default-config"]).is_ok());
    }

    #[test]
    fn test_overrides() {
        let args =
            Args::try_parse_from(["vs-summary", "-l", "x", "--brief", "-c", "0", "-t", "1d"]).unwrap();
        let mut config = NarratorConfig::default();
        config.output.char_limit = 200;
        args.apply_overrides(&mut config);

        assert!(config.output.brief);
        assert_eq!(config.output.char_limit, 0);
        assert_eq!(config.output.time_range.as_deref(), Some("1d"));
    }

    #[test]
    fn test_no_overrides_keep_file_values() {
        let args = Args::try_parse_from(["vs-summary", "-l", "x"]).unwrap();
        let mut config = NarratorConfig::default();
        config.output.brief = true;
        config.output.char_limit = 200;
        args.apply_overrides(&mut config);

        assert!(config.output.brief);
        assert_eq!(config.output.char_limit, 200);
    }
}
