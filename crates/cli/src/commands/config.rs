//! Configuration commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use linewatch::config::Config;

use super::load_config;

const REDACTED: &str = "<redacted>";

/// Config file the command operates on: the explicit path or the user config.
fn target_path(explicit: Option<&Path>) -> Result<PathBuf> {
  match explicit {
    Some(path) => Ok(path.to_path_buf()),
    None => Config::user_config_path().context("Could not determine user config path"),
  }
}

/// Effective configuration as TOML, with the bot token hidden
fn render_effective(config: &Config) -> Result<String> {
  let mut shown = config.clone();
  if shown.telegram.bot_token.is_some() {
    shown.telegram.bot_token = Some(REDACTED.to_string());
  }
  Ok(toml::to_string_pretty(&shown)?)
}

/// Show the effective configuration
pub fn cmd_config_show(explicit: Option<&Path>) -> Result<()> {
  let config = load_config(explicit)?;

  match explicit {
    Some(path) => println!("Using config: {:?}", path),
    None => match Config::user_config_path() {
      Some(path) if path.exists() => println!("Using user config: {:?}", path),
      _ => println!("Using default configuration (no config file found)"),
    },
  }
  println!("Watched file: {:?}", config.watch.file_path());
  if config.telegram.bot_token.is_none() && config.telegram.resolve_token().is_some() {
    println!("Bot token: from {}", linewatch::config::BOT_TOKEN_ENV);
  }
  println!();
  println!("{}", render_effective(&config)?);

  Ok(())
}

/// Write a commented config template
pub fn cmd_config_init(explicit: Option<&Path>, force: bool) -> Result<()> {
  let path = target_path(explicit)?;
  write_template(&path, force)?;

  println!("Created config: {:?}", path);
  println!("Set telegram.bot_token (or {}) before running.", linewatch::config::BOT_TOKEN_ENV);
  Ok(())
}

fn write_template(path: &Path, force: bool) -> Result<()> {
  if path.exists() && !force {
    bail!("Config file already exists: {:?} (use --force to overwrite)", path);
  }

  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
  }

  std::fs::write(path, Config::generate_template()).with_context(|| format!("Failed to write {:?}", path))?;
  Ok(())
}
