//! Command-line front end for the narrator.
//!
//! Finds the server's log files, loads the resume cursor, runs one
//! summarization pass and writes the summary and the next cursor back out.

pub mod cli;
pub mod discover;
pub mod logging;
pub mod run;
pub mod state;

pub use cli::Args;
pub use discover::{discover, DiscoverError};
pub use run::execute;
