//! CLI module
//!
//! Command-line interface of the tap.
//!
//! # Modes
//!
//! - `--discover` - print the catalog of available streams
//! - default - sync the selected streams, writing messages to stdout

mod commands;
mod runner;

pub use commands::Cli;
pub use runner::Runner;
