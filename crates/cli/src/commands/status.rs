//! Status command

use std::path::Path;

use anyhow::{Context, Result};
use linewatch::bot::{collect_status, render_plain};

use super::load_config;

/// Print unique entries of every .txt file in the watched folder
pub async fn cmd_status(config_path: Option<&Path>) -> Result<()> {
  let config = load_config(config_path)?;
  let directory = &config.watch.directory;

  let report = collect_status(directory)
    .await
    .with_context(|| format!("Failed to read {}", directory.display()))?;

  println!("Watched folder: {}", directory.display());
  println!();
  print!("{}", render_plain(&report));

  Ok(())
}
