// ExFig - Batch export of design assets
// Copyright (c) 2025 ExFig Contributors
// Licensed under the MIT License

use clap::Parser;
use exfig::cli::{Cli, Commands};
use exfig::config::LoggingConfig;
use exfig::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Optional .env file with FIGMA_PERSONAL_TOKEN and EXFIG_* overrides
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console only; file logging is for long-running library callers
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    let logging_config = LoggingConfig {
        log_level: log_level.to_string(),
        local_enabled: false,
        ..LoggingConfig::default()
    };
    let _guard = match init_logging(log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "ExFig");

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    process::exit(exit_code);
}

async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Discover(args) => args.execute(&cli.settings).await,
        Commands::Status(args) => args.execute(&cli.settings).await,
    }
}
