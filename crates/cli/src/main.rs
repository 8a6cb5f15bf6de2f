//! Statwatch CLI - statwatch command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod logging;
mod system_config;
mod util;

/// Statwatch - Poll files for modification and react to changes
#[derive(Parser)]
#[command(name = "statwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch files and report every modification
    Watch {
        /// Files to watch
        paths: Vec<PathBuf>,

        /// Shell command to run after each change (STATWATCH_PATH holds the path)
        #[arg(short, long)]
        exec: Option<String>,

        /// Read paths from a file (one per line); the file is watched and reloaded on change
        #[arg(long)]
        paths_from: Option<PathBuf>,

        /// Poll interval in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Print one JSON object per change
        #[arg(long)]
        json: bool,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,

    /// Print a single value
    Get {
        /// Key, e.g. watch.poll_interval_ms
        key: String,
    },

    /// Change a single value
    Set {
        /// Key, e.g. watch.poll_interval_ms
        key: String,
        /// New value
        value: String,
    },

    /// Show the config file location
    Path {
        /// Create the file with defaults if it does not exist
        #[arg(long)]
        create: bool,
    },

    /// Print an example configuration
    Example,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let _log_guard = logging::init(cli.verbose, cli.log_file.as_deref())?;

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Watch {
            paths,
            exec,
            paths_from,
            interval_ms,
            json,
        } => {
            let config = system_config::load(config_path)?;
            let args = cmd::watch::WatchArgs {
                paths,
                exec,
                paths_from,
                interval_ms,
                json,
            };
            cmd::watch::run(args, config).await
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(config_path),
            ConfigCommands::Get { key } => cmd::config::run_get(config_path, &key),
            ConfigCommands::Set { key, value } => cmd::config::run_set(config_path, &key, &value),
            ConfigCommands::Path { create } => cmd::config::run_path(config_path, create),
            ConfigCommands::Example => cmd::config::run_example(),
        },
    }
}
