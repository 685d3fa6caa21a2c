//! WatcherTask - real-time change detection for the watched file
//!
//! The watcher bridges notify's blocking callback thread with the async
//! runtime:
//! 1. notify's sync callback uses `blocking_send` to forward events to a channel
//! 2. The async task consumes events from that channel
//! 3. Events for any path other than the watched file are dropped
//! 4. A burst of queued events is coalesced into one read of the file
//! 5. Lines not yet in the task's seen-set are forwarded to the DeliveryActor
//!
//! # Ownership
//!
//! The real-time seen-set lives inside the task and is only touched from
//! `run()`. notify's thread never sees it, so no lock is needed.
//!
//! # Lifecycle
//!
//! The watcher runs until:
//! - The `CancellationToken` is triggered
//! - The event channel closes (notify watcher dropped)
//!
//! Dropping the task drops the notify watcher, which stops its thread.

use std::{
  io,
  path::{Component, Path, PathBuf},
};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::handle::DeliveryHandle;
use crate::domain::line::LineSet;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the WatcherTask
#[derive(Debug, Clone)]
pub struct WatcherConfig {
  /// File to watch
  pub path: PathBuf,
  /// Capacity of the notify → task channel
  pub event_buffer: usize,
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur in the watcher
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
  #[error("Failed to initialize watcher: {0}")]
  Init(#[source] notify::Error),

  #[error("Failed to watch path: {0}")]
  Watch(#[source] notify::Error),

  #[error("Watched path has no parent directory or file name: {0}")]
  InvalidPath(PathBuf),

  #[error("Failed to resolve watched path {path}: {source}")]
  Resolve {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

type EventResult = Result<Event, notify::Error>;

// ============================================================================
// File Tracker
// ============================================================================

/// The watched file plus the lines already forwarded from it.
#[derive(Debug)]
pub struct FileTracker {
  target: PathBuf,
  file_name: String,
  seen: LineSet,
}

impl FileTracker {
  /// Resolve `path` to an absolute, normalized target.
  ///
  /// The parent directory is canonicalized when it exists so that event paths
  /// reported through symlinked directories still compare equal.
  pub fn new(path: &Path) -> Result<Self, WatcherError> {
    let absolute = std::path::absolute(path).map_err(|source| WatcherError::Resolve {
      path: path.to_path_buf(),
      source,
    })?;
    let normalized = normalize_path(&absolute);

    let (Some(parent), Some(file_name)) = (normalized.parent(), normalized.file_name()) else {
      return Err(WatcherError::InvalidPath(path.to_path_buf()));
    };

    let parent = std::fs::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf());
    let file_name = file_name.to_string_lossy().into_owned();

    Ok(Self {
      target: parent.join(&file_name),
      file_name,
      seen: LineSet::new(),
    })
  }

  pub fn target(&self) -> &Path {
    &self.target
  }

  pub fn file_name(&self) -> &str {
    &self.file_name
  }

  /// Directory that must be watched to see changes to the target
  pub fn directory(&self) -> &Path {
    self.target.parent().unwrap_or(&self.target)
  }

  /// Number of distinct lines forwarded so far
  pub fn seen_count(&self) -> usize {
    self.seen.len()
  }

  /// Whether an event path refers to the watched file
  pub fn matches(&self, path: &Path) -> bool {
    if normalize_path(path) == self.target {
      return true;
    }
    // Fall back to the filesystem for paths reported through a different
    // spelling of the same directory.
    path.file_name().map(|n| n == self.file_name.as_str()).unwrap_or(false)
      && std::fs::canonicalize(path).map(|p| p == self.target).unwrap_or(false)
  }

  /// Read the whole file and return lines not forwarded before, marking them seen.
  pub async fn read_new_lines(&mut self) -> io::Result<Vec<String>> {
    let bytes = tokio::fs::read(&self.target).await?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(self.seen.diff_new(content.lines()))
  }
}

/// Lexically resolve `.` and `..` segments without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
          normalized.pop();
        } else if !normalized.has_root() {
          normalized.push("..");
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

// ============================================================================
// WatcherTask
// ============================================================================

/// Async file watcher that forwards new lines to a DeliveryActor
///
/// # Example
///
/// ```ignore
/// let config = WatcherConfig { path: watched_file, event_buffer: 256 };
/// let task = WatcherTask::new(config, delivery_handle, cancel_token)?;
/// tokio::spawn(task.run());
/// ```
pub struct WatcherTask {
  tracker: FileTracker,
  forwarder: DeliveryHandle,
  cancel: CancellationToken,
  // The notify watcher must be held to keep it alive
  _watcher: Option<RecommendedWatcher>,
  // Channel receiving events from notify's sync callback
  event_rx: mpsc::Receiver<EventResult>,
}

impl WatcherTask {
  /// Create a new WatcherTask
  ///
  /// This starts a non-recursive watch on the file's parent directory.
  /// The task is not started until `run()` is called.
  pub fn new(config: WatcherConfig, forwarder: DeliveryHandle, cancel: CancellationToken) -> Result<Self, WatcherError> {
    let tracker = FileTracker::new(&config.path)?;
    info!(path = %tracker.target().display(), "Initializing file watcher");

    // The sync callback will use blocking_send, so we need a reasonable buffer
    let (event_tx, event_rx) = mpsc::channel::<EventResult>(config.event_buffer.max(1));

    let mut watcher = RecommendedWatcher::new(
      move |res| {
        // This runs on notify's thread - use blocking_send
        // If the channel is closed the task has stopped; drop the event
        let _ = event_tx.blocking_send(res);
      },
      Config::default(),
    )
    .map_err(WatcherError::Init)?;

    // Siblings and subdirectories are filtered out in `run()`
    watcher
      .watch(tracker.directory(), RecursiveMode::NonRecursive)
      .map_err(WatcherError::Watch)?;

    info!(path = %tracker.target().display(), "File watcher initialized");

    Ok(Self {
      tracker,
      forwarder,
      cancel,
      _watcher: Some(watcher),
      event_rx,
    })
  }

  /// Build a task fed from an existing event channel instead of an OS watcher
  pub fn with_events(
    tracker: FileTracker,
    forwarder: DeliveryHandle,
    cancel: CancellationToken,
    event_rx: mpsc::Receiver<EventResult>,
  ) -> Self {
    Self {
      tracker,
      forwarder,
      cancel,
      _watcher: None,
      event_rx,
    }
  }

  /// Spawn the watcher task and return its join handle
  pub fn spawn(
    config: WatcherConfig,
    forwarder: DeliveryHandle,
    cancel: CancellationToken,
  ) -> Result<tokio::task::JoinHandle<()>, WatcherError> {
    let task = Self::new(config, forwarder, cancel)?;
    Ok(tokio::spawn(task.run()))
  }

  /// Run the watcher task
  ///
  /// This consumes the task and runs until:
  /// - The `CancellationToken` is triggered
  /// - The event channel closes
  pub async fn run(mut self) {
    info!(path = %self.tracker.target().display(), "WatcherTask started");

    loop {
      tokio::select! {
          // Check cancellation first (biased)
          biased;

          _ = self.cancel.cancelled() => {
              info!("WatcherTask shutting down (cancelled)");
              break;
          }

          event = self.event_rx.recv() => {
              match event {
                  Some(event) => {
                      let mut relevant = self.is_relevant(event);
                      // Coalesce whatever else is already queued into the same read
                      while let Ok(event) = self.event_rx.try_recv() {
                          relevant |= self.is_relevant(event);
                      }
                      if relevant {
                          self.on_file_modified().await;
                      }
                  }
                  None => {
                      info!("WatcherTask shutting down (channel closed)");
                      break;
                  }
              }
          }
      }
    }

    info!(
      path = %self.tracker.target().display(),
      forwarded = self.tracker.seen_count(),
      "WatcherTask stopped"
    );
  }

  /// Whether an event should trigger a re-read of the watched file
  fn is_relevant(&self, event: EventResult) -> bool {
    let event = match event {
      Ok(event) => event,
      Err(e) => {
        warn!(error = %e, "Watcher error");
        return false;
      }
    };

    match event.kind {
      EventKind::Modify(_) | EventKind::Create(_) => {}
      EventKind::Access(_) | EventKind::Remove(_) | EventKind::Any | EventKind::Other => {
        trace!(kind = ?event.kind, "Ignoring event");
        return false;
      }
    }

    let relevant = event.paths.iter().any(|p| self.tracker.matches(p));
    if !relevant {
      trace!(paths = ?event.paths, "Ignoring event for other path");
    }
    relevant
  }

  /// Read the file, forward every new line in file order
  async fn on_file_modified(&mut self) {
    let lines = match self.tracker.read_new_lines().await {
      Ok(lines) => lines,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %self.tracker.target().display(), "Watched file is missing, skipping event");
        return;
      }
      Err(e) => {
        warn!(path = %self.tracker.target().display(), error = %e, "Failed to read watched file, skipping event");
        return;
      }
    };

    if lines.is_empty() {
      trace!("No new lines");
      return;
    }

    debug!(count = lines.len(), "Forwarding new lines");

    for line in lines {
      if let Err(e) = self.forwarder.forward(self.tracker.file_name(), line).await {
        warn!(error = %e, "Failed to queue new entry");
        return;
      }
    }
  }
}
