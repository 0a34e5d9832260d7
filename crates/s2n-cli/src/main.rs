//! s2n CLI - Main entry point

use std::process;

use clap::Parser;
use s2n_cli::{Cli, Commands};
use s2n_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { LogLevel::Debug } else { LogLevel::Warn };
    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Console)
        .log_file_prefix("s2n")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env().unwrap_or_default();

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok().flatten();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> s2n_cli::Result<()> {
    match &cli.command {
        Commands::Providers => s2n_cli::commands::providers::run(cli.format),
        command => s2n_cli::commands::query::run(command, cli.fixtures.as_deref(), cli.format).await,
    }
}
