//! Configuration system for linewatch.
//!
//! Config priority: explicit path (`--config`) > user (~/.config/linewatch/config.toml) > defaults

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::{Deserialize, Serialize};

use super::line::DEFAULT_CHUNK_SIZE;

/// Environment variable consulted when no bot token is configured
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

// ============================================================================
// Watch Configuration
// ============================================================================

/// Which file to watch and how events are buffered
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
  /// Directory holding the watched file (also listed by `/status`)
  pub directory: PathBuf,

  /// Name of the watched file inside `directory` (default: "chiqmadi.txt")
  pub file_name: String,

  /// Capacity of the channel between notify's thread and the watcher task
  pub event_buffer: usize,

  /// Capacity of the real-time delivery queue
  pub delivery_buffer: usize,
}

impl Default for WatchConfig {
  fn default() -> Self {
    Self {
      directory: PathBuf::from("logs"),
      file_name: "chiqmadi.txt".to_string(),
      event_buffer: 256,
      delivery_buffer: 256,
    }
  }
}

impl WatchConfig {
  /// Full path of the watched file
  pub fn file_path(&self) -> PathBuf {
    self.directory.join(&self.file_name)
  }
}

// ============================================================================
// Digest Configuration
// ============================================================================

/// Periodic digest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
  /// Seconds between digest flushes (default: 86400, once a day)
  pub interval_secs: u64,

  /// Maximum characters per digest message (default: 4000)
  pub chunk_size: usize,

  /// Keep digested lines for the process lifetime (default: true).
  /// When false the digest seen-set is cleared after every successful flush.
  pub retain_seen: bool,

  /// Send a diagnostic message when a digest cycle fails (default: true)
  pub report_errors: bool,
}

impl Default for DigestConfig {
  fn default() -> Self {
    Self {
      interval_secs: 86_400,
      chunk_size: DEFAULT_CHUNK_SIZE,
      retain_seen: true,
      report_errors: true,
    }
  }
}

impl DigestConfig {
  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval_secs.max(1))
  }
}

// ============================================================================
// Telegram Configuration
// ============================================================================

/// Telegram Bot API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
  /// Bot token. If not set, reads from TELEGRAM_BOT_TOKEN env var
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bot_token: Option<String>,

  /// Chat that receives notifications. Unset until a user sends /start
  #[serde(skip_serializing_if = "Option::is_none")]
  pub chat_id: Option<i64>,

  /// Bot API base URL
  pub api_url: String,

  /// HTTP request timeout in seconds (default: 60)
  pub request_timeout_secs: u64,

  /// Long-poll timeout for getUpdates in seconds (default: 30)
  pub poll_timeout_secs: u64,

  /// Answer chat commands (/start, /status, /help, /get)
  pub commands: bool,
}

impl Default for TelegramConfig {
  fn default() -> Self {
    Self {
      bot_token: None,
      chat_id: None,
      api_url: "https://api.telegram.org".to_string(),
      request_timeout_secs: 60,
      poll_timeout_secs: 30,
      commands: true,
    }
  }
}

impl TelegramConfig {
  /// Configured token, falling back to the environment
  pub fn resolve_token(&self) -> Option<String> {
    self
      .bot_token
      .clone()
      .filter(|t| !t.trim().is_empty())
      .or_else(|| std::env::var(BOT_TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()))
  }
}

// ============================================================================
// Daemon Configuration
// ============================================================================

/// Process-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
  /// Log level: "off", "error", "warn", "info", "debug", "trace"
  /// Default: "info"
  #[serde(default = "default_log_level")]
  pub log_level: String,

  /// Log file rotation: "daily", "hourly", "never"
  /// Default: "daily"
  #[serde(default = "default_log_rotation")]
  pub log_rotation: String,
}

fn default_log_level() -> String {
  "info".to_string()
}
fn default_log_rotation() -> String {
  "daily".to_string()
}

impl Default for DaemonConfig {
  fn default() -> Self {
    Self {
      log_level: default_log_level(),
      log_rotation: default_log_rotation(),
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

/// linewatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Watched file settings
  #[serde(default)]
  pub watch: WatchConfig,

  /// Periodic digest settings
  #[serde(default)]
  pub digest: DigestConfig,

  /// Telegram transport settings
  #[serde(default)]
  pub telegram: TelegramConfig,

  /// Logging settings
  #[serde(default)]
  pub daemon: DaemonConfig,
}

impl Config {
  /// Load config from an explicit file. Errors are reported, not defaulted.
  pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Load config from `explicit` if given, else the user config, else defaults
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    if let Some(path) = explicit {
      return Self::load_from(path);
    }

    if let Some(user_config_path) = Self::user_config_path()
      && user_config_path.exists()
    {
      return Self::load_from(&user_config_path);
    }

    Ok(Self::default())
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("linewatch").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("linewatch").join("config.toml"))
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    let defaults = Self::default();
    format!(
      r#"# linewatch Configuration
# Place in ~/.config/linewatch/config.toml or pass --config <path>

# ============================================================================
# Watched File
# ============================================================================

[watch]
# Directory holding the watched file; /status lists every .txt file here
directory = "{directory}"
# File the external writer appends to
file_name = "{file_name}"

# ============================================================================
# Digest
# ============================================================================

[digest]
# Seconds between reports (86400 = once a day)
interval_secs = {interval_secs}
# Maximum characters per report message
chunk_size = {chunk_size}
# Never re-report a line that was in an earlier report
retain_seen = {retain_seen}
# Send a diagnostic message when a report cycle fails
report_errors = {report_errors}

# ============================================================================
# Telegram
# ============================================================================

[telegram]
# bot_token = "123456:ABC..."   # or set {token_env}
# chat_id = 123456789           # otherwise the first /start registers the chat
api_url = "{api_url}"
poll_timeout_secs = {poll_timeout_secs}
commands = {commands}

# ============================================================================
# Logging
# ============================================================================

[daemon]
# off, error, warn, info, debug, trace (RUST_LOG overrides)
log_level = "{log_level}"
# daily, hourly, never
log_rotation = "{log_rotation}"
"#,
      directory = defaults.watch.directory.display(),
      file_name = defaults.watch.file_name,
      interval_secs = defaults.digest.interval_secs,
      chunk_size = defaults.digest.chunk_size,
      retain_seen = defaults.digest.retain_seen,
      report_errors = defaults.digest.report_errors,
      token_env = BOT_TOKEN_ENV,
      api_url = defaults.telegram.api_url,
      poll_timeout_secs = defaults.telegram.poll_timeout_secs,
      commands = defaults.telegram.commands,
      log_level = defaults.daemon.log_level,
      log_rotation = defaults.daemon.log_rotation,
    )
  }
}
