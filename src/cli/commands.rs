//! CLI arguments

use clap::Parser;
use std::path::PathBuf;

/// PagerDuty tap: extracts incidents, services, notifications and
/// escalation policies as a stream of JSON messages
#[derive(Parser, Debug)]
#[command(name = "tap-pagerduty")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, required_unless_present = "config_json")]
    pub config: Option<PathBuf>,

    /// Inline config JSON
    #[arg(long, conflicts_with = "config")]
    pub config_json: Option<String>,

    /// State file (JSON) from a previous run
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Catalog file (JSON) selecting the streams to sync
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Print the catalog of available streams instead of syncing
    #[arg(short, long)]
    pub discover: bool,

    /// Directory of `<stream_id>.json` files overriding the bundled schemas
    #[arg(long)]
    pub schemas_dir: Option<PathBuf>,

    /// Write the final state to this file
    #[arg(long)]
    pub state_output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync_args() {
        let cli = Cli::parse_from([
            "tap-pagerduty",
            "--config",
            "config.json",
            "--state",
            "state.json",
            "--catalog",
            "catalog.json",
            "--state-output",
            "out.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("config.json")));
        assert_eq!(cli.state, Some(PathBuf::from("state.json")));
        assert_eq!(cli.catalog, Some(PathBuf::from("catalog.json")));
        assert_eq!(cli.state_output, Some(PathBuf::from("out.json")));
        assert!(!cli.discover);
    }

    #[test]
    fn test_parse_discover_with_inline_config() {
        let cli = Cli::parse_from(["tap-pagerduty", "--config-json", "{}", "-d", "-v"]);
        assert!(cli.discover);
        assert!(cli.verbose);
        assert_eq!(cli.config_json.as_deref(), Some("{}"));
    }

    #[test]
    fn test_config_is_required() {
        assert!(Cli::try_parse_from(["tap-pagerduty", "--discover"]).is_err());
        assert!(Cli::try_parse_from([
            "tap-pagerduty",
            "--config",
            "a.json",
            "--config-json",
            "{}"
        ])
        .is_err());
    }
}
