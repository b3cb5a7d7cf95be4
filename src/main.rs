//! CLI entry point for the covercache tool.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use covercache::SettingsStore;
use tracing::debug;

mod cli;
mod commands;

use cli::{Args, Command, ConfigCommand};
use commands::{
    run_config_path_command, run_config_reset_command, run_config_set_command,
    run_config_show_command, run_fetch_command, run_status_command,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let store = match &args.settings {
        Some(path) => SettingsStore::new(path.clone()),
        None => SettingsStore::default_location()?,
    };

    let ok = match &args.command {
        Command::Status => run_status_command(&store).await?,
        Command::Fetch { reference, output } => {
            run_fetch_command(&store, reference, output.as_deref()).await?
        }
        Command::Config { command } => {
            match command {
                ConfigCommand::Show => run_config_show_command(&store)?,
                ConfigCommand::Set { url, api_key } => {
                    run_config_set_command(&store, url, api_key)?;
                }
                ConfigCommand::Reset => run_config_reset_command(&store)?,
                ConfigCommand::Path => run_config_path_command(&store)?,
            }
            true
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
