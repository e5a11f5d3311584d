//! # calsync
//!
//! **calsync** turns activity on external platforms into a git contribution
//! calendar.
//!
//! Features:
//! - `calsync sync` commits new activity for every source in `config.toml`
//! - `calsync cursor` shows where each source was last synchronized
//! - `calsync list` shows the configured sources
//! - `calsync home` prints the configuration directory
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Parser, Subcommand};
use calsync::{calsync_home, cmd_cursor, cmd_list, cmd_sync};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "calsync",
    version,
    about = "calsync - mirror external activity into a git contribution calendar",
    arg_required_else_help = true
)]
struct Cli {
    /// Path to config.toml (defaults to $(calsync home)/config.toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Commit new activity from every configured source
    Sync {
        /// Print pending activity without committing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the last synchronized point of each source
    Cursor,
    /// List configured sources
    List,
    /// Print the calsync configuration directory
    Home,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.cmd {
        Cmd::Sync { dry_run } => cmd_sync(config, dry_run),
        Cmd::Cursor => cmd_cursor(config),
        Cmd::List => cmd_list(config),
        Cmd::Home => {
            println!("{}", calsync_home()?.display());
            Ok(())
        }
    }
}
