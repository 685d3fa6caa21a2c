//! Run command

use anyhow::{Context, Result};
use linewatch::{Daemon, RuntimeConfig, config::Config};
use tracing::info;

/// Watch the configured file until ctrl-c
pub async fn cmd_run(mut config: Config, foreground: bool, digest_interval: Option<u64>) -> Result<()> {
  if let Some(secs) = digest_interval {
    config.digest.interval_secs = secs;
  }

  let daemon = Daemon::new(RuntimeConfig::new(config, foreground));

  info!("Starting linewatch");
  daemon.run().await.context("Failed to run linewatch")?;

  Ok(())
}
