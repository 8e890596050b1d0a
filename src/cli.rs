//! Command-line interface for the `daily-story` binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Pick the day's most corroborated news story and write it up")]
pub struct Cli {
    /// Path to the TOML config (default: $DAILY_STORY_CONFIG_PATH, then config/daily_story.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Gather, select, generate and persist one document
    Run {
        /// Select and build the request, but skip generation and writing
        #[arg(long)]
        dry_run: bool,

        /// Write Prometheus metrics to this file after the run
        #[arg(long, env = "DAILY_STORY_METRICS_TEXTFILE")]
        metrics_textfile: Option<PathBuf>,
    },
    /// Serve the archive API
    Serve {
        #[arg(long, env = "DAILY_STORY_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Print the archive, newest first
    List,
}
