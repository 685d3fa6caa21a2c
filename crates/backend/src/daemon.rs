//! Daemon lifecycle management using the actor-based architecture.
//!
//! The daemon owns the watched-file path and wires every task onto one
//! cooperative runtime. notify's own thread is the only other execution
//! context; it talks to the runtime through the watcher's event channel.
//!
//! # Architecture
//!
//! ```text
//! Daemon (Coordinator)
//!   ├── WatcherTask   (notify events → new lines)
//!   ├── DeliveryActor (new lines → Notifier)
//!   ├── DigestTask    (interval → report + truncate)
//!   └── CommandPoller (Telegram commands, optional)
//! ```
//!
//! # Lifecycle
//!
//! 1. Bootstrap the watched directory and file
//! 2. Create master `CancellationToken`
//! 3. Spawn DeliveryActor, WatcherTask, DigestTask, CommandPoller
//! 4. Wait for ctrl-c (or an explicit shutdown)
//! 5. Cancel children, wait for tasks; dropping the WatcherTask stops notify

use std::{
  io,
  path::{Path, PathBuf},
  sync::Arc,
};

use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
  actor::{DeliveryActor, DigestTask, WatcherConfig, WatcherError, WatcherTask},
  bot::CommandPoller,
  domain::config::Config,
  transport::{DeliveryError, Notifier, Recipient, TelegramClient, TelegramNotifier},
};

// ============================================================================
// Configuration
// ============================================================================

/// Daemon runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
  /// Run in foreground mode (console logging)
  pub foreground: bool,
  /// Full configuration (watch, digest, telegram, logging)
  pub config: Config,
}

impl RuntimeConfig {
  pub fn new(config: Config, foreground: bool) -> Self {
    Self { foreground, config }
  }

  /// Path of the watched file
  pub fn watched_file(&self) -> PathBuf {
    self.config.watch.file_path()
  }
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
  #[error("Failed to prepare {path}: {source}")]
  Bootstrap {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error(transparent)]
  Watcher(#[from] WatcherError),
  #[error(transparent)]
  Transport(#[from] DeliveryError),
}

/// Create the watched directory and an empty watched file if either is missing.
pub async fn ensure_watched_file(path: &Path) -> Result<(), DaemonError> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
    && !tokio::fs::try_exists(parent).await.unwrap_or(false)
  {
    info!(directory = %parent.display(), "Watched folder not found, creating it");
    tokio::fs::create_dir_all(parent)
      .await
      .map_err(|source| DaemonError::Bootstrap {
        path: parent.to_path_buf(),
        source,
      })?;
  }

  if !tokio::fs::try_exists(path).await.unwrap_or(false) {
    info!(path = %path.display(), "Watched file not found, creating it");
    tokio::fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(path)
      .await
      .map_err(|source| DaemonError::Bootstrap {
        path: path.to_path_buf(),
        source,
      })?;
  }

  Ok(())
}

// ============================================================================
// Daemon
// ============================================================================

/// The linewatch daemon - manages the entire application lifecycle.
///
/// # Usage
///
/// ```ignore
/// let daemon = Daemon::new(RuntimeConfig::new(config, true));
/// daemon.run().await?;
/// ```
pub struct Daemon {
  runtime_config: RuntimeConfig,
}

impl Daemon {
  /// Create a new daemon with the given configuration.
  pub fn new(runtime_config: RuntimeConfig) -> Self {
    Self { runtime_config }
  }

  /// Run the daemon against Telegram until ctrl-c.
  pub async fn run(self) -> Result<(), DaemonError> {
    let telegram = &self.runtime_config.config.telegram;
    let client = TelegramClient::new(telegram)?;
    let recipient = Recipient::new(telegram.chat_id);

    if recipient.is_set() {
      info!("Notification recipient configured");
    } else {
      info!("No recipient configured, waiting for /start");
    }

    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(client.clone(), recipient.clone()));
    let commands = telegram.commands.then_some(client);

    let running = self.start(notifier, commands, recipient).await?;

    // Handle ctrl-c gracefully
    let cancel_for_signal = running.cancel_token();
    tokio::spawn(async move {
      if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        return;
      }
      info!("Received ctrl-c, shutting down...");
      cancel_for_signal.cancel();
    });

    running.wait().await;
    Ok(())
  }

  /// Bootstrap and spawn every task, returning once they are running.
  ///
  /// `commands` enables the Telegram command poller.
  pub async fn start(
    self,
    notifier: Arc<dyn Notifier>,
    commands: Option<TelegramClient>,
    recipient: Recipient,
  ) -> Result<RunningDaemon, DaemonError> {
    let config = self.runtime_config.config;
    let watched = config.watch.file_path();

    info!("Starting linewatch daemon");
    info!("Watched file: {:?}", watched);

    ensure_watched_file(&watched).await?;

    // Master cancellation token - propagates to all children
    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    let (forwarder, delivery_task) =
      DeliveryActor::spawn(Arc::clone(&notifier), config.watch.delivery_buffer, cancel.child_token());
    tasks.push(delivery_task);

    let watcher_config = WatcherConfig {
      path: watched.clone(),
      event_buffer: config.watch.event_buffer,
    };
    match WatcherTask::spawn(watcher_config, forwarder, cancel.child_token()) {
      Ok(task) => tasks.push(task),
      Err(e) => {
        cancel.cancel();
        return Err(e.into());
      }
    }

    let digest = DigestTask::new(watched, Arc::clone(&notifier), config.digest.clone());
    tasks.push(tokio::spawn(digest.run(cancel.child_token())));
    info!("Started digest task (every {} seconds)", config.digest.interval().as_secs());

    if let Some(client) = commands {
      let poller = CommandPoller::new(client, recipient, config.watch.directory.clone(), config.digest.chunk_size);
      tasks.push(tokio::spawn(poller.run(cancel.child_token())));
    }

    Ok(RunningDaemon { cancel, tasks })
  }
}

/// Handle to a started daemon.
pub struct RunningDaemon {
  cancel: CancellationToken,
  tasks: Vec<JoinHandle<()>>,
}

impl RunningDaemon {
  /// Token that stops every task when cancelled
  pub fn cancel_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  /// Wait until cancelled, then for every task to finish.
  pub async fn wait(self) {
    self.cancel.cancelled().await;

    info!("Shutting down...");
    for task in self.tasks {
      if let Err(e) = task.await {
        warn!(error = %e, "Task ended abnormally");
      }
    }

    info!("Daemon shutdown complete");
  }

  /// Cancel every task and wait for them.
  pub async fn shutdown(self) {
    self.cancel.cancel();
    self.wait().await;
  }
}
