//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Browse and verify a Readarr/Chaptarr-style server connection and fetch
/// authenticated cover art through the session cache.
#[derive(Parser, Debug)]
#[command(name = "covercache")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file path (defaults to $XDG_CONFIG_HOME/covercache/settings.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe the configured server's status endpoint
    Status,

    /// Resolve and fetch one cover-art reference through the cache
    Fetch {
        /// Image reference, e.g. "MediaCover/Books/42/cover.jpg"
        reference: String,

        /// Write the fetched bytes to this file instead of reporting the size
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show, change or reset the saved server settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the saved settings (API key redacted)
    Show,

    /// Validate and save server settings
    Set {
        /// Server base URL, e.g. https://host:8787
        #[arg(long)]
        url: String,

        /// API key issued by the server
        #[arg(long)]
        api_key: String,
    },

    /// Remove the saved settings (returns to first-run state)
    Reset,

    /// Print the settings file path
    Path,
}
