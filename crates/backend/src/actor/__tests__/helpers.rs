//! Test helpers for actor integration tests.
//!
//! Provides `WatchTestContext`, which owns a temporary watched file, and
//! `RecordingNotifier`, an in-memory notifier that can be told to fail.

use std::{
  path::PathBuf,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use crate::transport::{DeliveryError, Notifier};

/// Notifier that records every message and reports it on a channel.
pub struct RecordingNotifier {
  sent: Mutex<Vec<String>>,
  tx: mpsc::UnboundedSender<String>,
  failing: AtomicBool,
  ready: AtomicBool,
  attempts: AtomicUsize,
}

impl RecordingNotifier {
  pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let notifier = Arc::new(Self {
      sent: Mutex::new(Vec::new()),
      tx,
      failing: AtomicBool::new(false),
      ready: AtomicBool::new(true),
      attempts: AtomicUsize::new(0),
    });
    (notifier, rx)
  }

  /// Make every following `notify` call fail (or succeed again).
  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn set_ready(&self, ready: bool) {
    self.ready.store(ready, Ordering::SeqCst);
  }

  /// Messages delivered successfully so far
  pub fn sent(&self) -> Vec<String> {
    self.sent.lock().expect("sent lock").clone()
  }

  /// Every call to `notify`, successful or not
  pub fn attempts(&self) -> usize {
    self.attempts.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Notifier for RecordingNotifier {
  fn name(&self) -> &str {
    "recording"
  }

  fn is_ready(&self) -> bool {
    self.ready.load(Ordering::SeqCst)
  }

  async fn notify(&self, text: &str) -> Result<(), DeliveryError> {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    if self.failing.load(Ordering::SeqCst) {
      return Err(DeliveryError::Api("simulated transport failure".to_string()));
    }
    self.sent.lock().expect("sent lock").push(text.to_string());
    let _ = self.tx.send(text.to_string());
    Ok(())
  }
}

/// Temporary directory holding one watched file.
pub struct WatchTestContext {
  pub dir: TempDir,
  pub file: PathBuf,
}

impl WatchTestContext {
  /// Create the directory and an empty `chiqmadi.txt`.
  pub fn new() -> Self {
    let dir = TempDir::new().expect("create temp dir");
    let file = dir.path().join("chiqmadi.txt");
    std::fs::write(&file, "").expect("create watched file");
    Self { dir, file }
  }

  /// Append raw text to the watched file.
  pub async fn append(&self, text: &str) {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
      .append(true)
      .open(&self.file)
      .await
      .expect("open watched file");
    file.write_all(text.as_bytes()).await.expect("append");
    file.flush().await.expect("flush");
  }

  /// Replace the watched file's content.
  pub async fn write(&self, text: &str) {
    tokio::fs::write(&self.file, text).await.expect("write watched file");
  }

  pub async fn read(&self) -> String {
    tokio::fs::read_to_string(&self.file).await.expect("read watched file")
  }
}

/// Receive the next message or panic after `secs` seconds.
pub async fn next_message(rx: &mut mpsc::UnboundedReceiver<String>, secs: u64) -> String {
  tokio::time::timeout(Duration::from_secs(secs), rx.recv())
    .await
    .expect("timeout waiting for notification")
    .expect("notifier channel closed")
}

/// Assert that no message arrives within `millis` milliseconds.
pub async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<String>, millis: u64) {
  if let Ok(Some(msg)) = tokio::time::timeout(Duration::from_millis(millis), rx.recv()).await {
    panic!("unexpected notification: {:?}", msg);
  }
}
