//! CLI interface and argument parsing
//!
//! The binary only inspects a project: exporting needs an exporter and a
//! remote transport, which are supplied by library callers.

pub mod commands;

use clap::{Parser, Subcommand};

/// ExFig - batch export of design assets
#[derive(Parser, Debug)]
#[command(name = "exfig")]
#[command(version, about, long_about = None)]
#[command(author = "ExFig Contributors")]
pub struct Cli {
    /// Path to the engine settings file
    #[arg(short, long, default_value = "exfig.toml", env = "EXFIG_SETTINGS")]
    pub settings: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "EXFIG_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the configs a batch would run, output conflicts and file ids
    Discover(commands::discover::DiscoverArgs),

    /// Show checkpoint and tracking cache state
    Status(commands::status::StatusArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parse_discover_directory() {
        let cli = Cli::parse_from(["exfig", "discover", "configs"]);
        assert_eq!(cli.settings, "exfig.toml");
        match cli.command {
            Commands::Discover(args) => {
                assert_eq!(args.dir, Some(PathBuf::from("configs")));
                assert!(args.configs.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_discover_explicit_configs() {
        let cli = Cli::parse_from([
            "exfig", "discover", "--config", "ios.pkl", "--config", "android.pkl",
        ]);
        match cli.command {
            Commands::Discover(args) => assert_eq!(args.configs.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_directory_with_configs() {
        let result = Cli::try_parse_from(["exfig", "discover", "dir", "--config", "a.pkl"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_with_settings_and_log_level() {
        let cli = Cli::parse_from([
            "exfig", "--settings", "custom.toml", "--log-level", "debug", "status",
        ]);
        assert_eq!(cli.settings, "custom.toml");
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Status(_)));
    }
}
