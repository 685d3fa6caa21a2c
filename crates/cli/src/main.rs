//! linewatch CLI - forward new log lines to Telegram and send a periodic digest

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

use commands::{cmd_config_init, cmd_config_show, cmd_run, cmd_status};
use logging::{init_cli_logging, init_daemon_logging};

#[derive(Parser)]
#[command(name = "linewatch")]
#[command(about = "Watch a log file, forward new lines to Telegram and send a periodic digest")]
#[command(after_help = "\
QUICK START:
  linewatch config init           # Write a config template
  linewatch run --foreground      # Start watching with console logs
  linewatch status                # Show unique entries per .txt file

ENVIRONMENT:
  TELEGRAM_BOT_TOKEN              # Bot token when not set in config
  RUST_LOG                        # Override the configured log level")]
struct Cli {
  /// Config file (default: ~/.config/linewatch/config.toml)
  #[arg(short, long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

/// Subcommands for `linewatch config`
#[derive(Subcommand)]
pub enum ConfigCommand {
  /// Show the effective configuration
  Show,
  /// Write a commented config template
  Init {
    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
  },
}

#[derive(Subcommand)]
enum Commands {
  /// Watch the configured file until ctrl-c
  Run {
    /// Log to the console instead of the log file
    #[arg(long)]
    foreground: bool,
    /// Seconds between digest reports (overrides config)
    #[arg(long, value_name = "SECONDS")]
    digest_interval: Option<u64>,
  },
  /// Show unique entries of every .txt file in the watched folder
  Status,
  /// Manage configuration
  #[command(after_help = "\
CONFIG LOCATIONS:
  User:     ~/.config/linewatch/config.toml
  Override: $CONFIG_DIR/config.toml")]
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let config_path = cli.config.as_deref();

  match cli.command {
    Commands::Run {
      foreground,
      digest_interval,
    } => {
      let config = commands::load_config(config_path)?;
      // File logging for the daemon, console-only for other commands
      let _guard = init_daemon_logging(&config.daemon, foreground);
      cmd_run(config, foreground, digest_interval).await
    }
    Commands::Status => {
      init_cli_logging();
      cmd_status(config_path).await
    }
    Commands::Config { command } => {
      init_cli_logging();
      match command {
        ConfigCommand::Show => cmd_config_show(config_path),
        ConfigCommand::Init { force } => cmd_config_init(config_path, force),
      }
    }
  }
}
