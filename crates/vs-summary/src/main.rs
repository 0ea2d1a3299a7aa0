//! Vintage Story server log summarizer
//!
//! Turns the latest stretch of server logs into a few lines of prose.

use clap::Parser;
use std::process::ExitCode;

use vs_summary::{logging, Args};

fn main() -> ExitCode {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", narrator::default_config_toml());
        return ExitCode::SUCCESS;
    }

    logging::init_logging(args.verbose);

    match vs_summary::execute(&args) {
        Ok(summary) => {
            if args.stdout {
                println!("{}", summary.text);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
