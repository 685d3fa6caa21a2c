//! CLI command implementations

mod config;
mod run;
mod status;

use std::path::Path;

use anyhow::{Context, Result};
use linewatch::config::Config;

pub use config::{cmd_config_init, cmd_config_show};
pub use run::cmd_run;
pub use status::cmd_status;

/// Load the explicit config file, else the user config, else defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
  Config::load(path).context("Failed to load configuration")
}
