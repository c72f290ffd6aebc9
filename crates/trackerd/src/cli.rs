//! Command-line interface handling for the invite tracker daemon.
//!
//! Argument parsing uses the `clap` builder API; every option here only
//! overrides what the configuration file already provides.

use clap::{Arg, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the ledger data file
    pub data_file: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses command line arguments using clap.
    pub fn parse() -> Self {
        let matches = Command::new("Invite Tracker")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Domain-attribution and milestone-notification daemon")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("tracker.toml"),
            )
            .arg(
                Arg::new("data-file")
                    .short('d')
                    .long("data-file")
                    .value_name("FILE")
                    .help("Ledger data file path"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .get_matches();

        Self {
            config_path: PathBuf::from(
                matches
                    .get_one::<String>("config")
                    .expect("Default config path should always be set"),
            ),
            data_file: matches.get_one::<String>("data-file").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_structure() {
        let args = CliArgs {
            config_path: PathBuf::from("test.toml"),
            data_file: Some(PathBuf::from("data/test.json")),
            log_level: Some("debug".to_string()),
            json_logs: true,
        };

        assert_eq!(args.config_path, PathBuf::from("test.toml"));
        assert_eq!(args.data_file, Some(PathBuf::from("data/test.json")));
        assert_eq!(args.log_level, Some("debug".to_string()));
        assert!(args.json_logs);
    }
}
