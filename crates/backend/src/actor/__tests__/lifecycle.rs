//! Daemon lifecycle tests: bootstrap, live forwarding, and shutdown.
//!
//! These run the real notify backend against a temporary directory, so
//! timeouts are generous.

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use tempfile::TempDir;

  use crate::{
    actor::__tests__::helpers::{RecordingNotifier, assert_quiet, next_message},
    daemon::{Daemon, RunningDaemon, RuntimeConfig},
    domain::config::Config,
    transport::{Recipient, format_realtime},
  };

  async fn start_in(dir: &TempDir, notifier: Arc<RecordingNotifier>) -> RunningDaemon {
    let mut config = Config::default();
    config.watch.directory = dir.path().join("logs");

    let daemon = Daemon::new(RuntimeConfig::new(config, true));
    let running = daemon
      .start(notifier, None, Recipient::unset())
      .await
      .expect("daemon starts");

    // Give notify time to register the directory
    tokio::time::sleep(Duration::from_millis(100)).await;
    running
  }

  async fn append(path: &std::path::Path, text: &str) {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new().append(true).open(path).await.unwrap();
    file.write_all(text.as_bytes()).await.unwrap();
    file.flush().await.unwrap();
  }

  #[tokio::test]
  async fn test_start_creates_missing_directory_and_file() {
    let dir = TempDir::new().unwrap();
    let (notifier, _rx) = RecordingNotifier::new();
    let running = start_in(&dir, notifier).await;

    let watched = dir.path().join("logs").join("chiqmadi.txt");
    assert!(watched.is_file());
    assert_eq!(std::fs::read_to_string(&watched).unwrap(), "");

    tokio::time::timeout(Duration::from_secs(5), running.shutdown())
      .await
      .expect("shutdown completes");
  }

  #[tokio::test]
  async fn test_appended_lines_are_forwarded() {
    let dir = TempDir::new().unwrap();
    let (notifier, mut rx) = RecordingNotifier::new();
    let running = start_in(&dir, notifier).await;
    let watched = dir.path().join("logs").join("chiqmadi.txt");

    append(&watched, "first\n").await;
    assert_eq!(next_message(&mut rx, 5).await, format_realtime("chiqmadi.txt", "first"));

    append(&watched, "first\nsecond\n").await;
    assert_eq!(next_message(&mut rx, 5).await, format_realtime("chiqmadi.txt", "second"));
    assert_quiet(&mut rx, 300).await;

    tokio::time::timeout(Duration::from_secs(5), running.shutdown())
      .await
      .expect("shutdown completes");
  }

  #[tokio::test]
  async fn test_failed_delivery_is_dropped() {
    let dir = TempDir::new().unwrap();
    let (notifier, mut rx) = RecordingNotifier::new();
    let running = start_in(&dir, notifier.clone()).await;
    let watched = dir.path().join("logs").join("chiqmadi.txt");

    notifier.set_failing(true);
    append(&watched, "lost\n").await;
    let attempted = tokio::time::timeout(Duration::from_secs(5), async {
      while notifier.attempts() == 0 {
        tokio::time::sleep(Duration::from_millis(20)).await;
      }
    })
    .await;
    assert!(attempted.is_ok(), "delivery was never attempted");

    notifier.set_failing(false);
    append(&watched, "kept\n").await;
    assert_eq!(next_message(&mut rx, 5).await, format_realtime("chiqmadi.txt", "kept"));
    assert!(!notifier.sent().iter().any(|m| m.contains("lost")));

    running.shutdown().await;
  }

  #[tokio::test]
  async fn test_cancel_token_stops_daemon() {
    let dir = TempDir::new().unwrap();
    let (notifier, _rx) = RecordingNotifier::new();
    let running = start_in(&dir, notifier).await;

    let cancel = running.cancel_token();
    let waiter = tokio::spawn(running.wait());
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), waiter)
      .await
      .expect("wait returns after cancel")
      .unwrap();
  }
}
