// Allow common clippy pedantic lints
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! PagerDuty tap CLI
//!
//! Writes SCHEMA, RECORD and STATE messages to stdout and logs to stderr.

use clap::Parser;
use pagerduty_tap::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; stdout carries the message stream
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    // Failures are already reported by the runner
    if runner.run().await.is_err() {
        std::process::exit(1);
    }
}
