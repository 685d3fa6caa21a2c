//! Actor handles for communicating with actors
//!
//! Handles are cheap to clone and provide a way to send messages to actors.

use tokio::sync::mpsc;

use super::message::PendingNotification;

// ============================================================================
// Delivery Handle
// ============================================================================

/// Handle to communicate with a DeliveryActor
///
/// This is the forwarder seen by the watcher: it queues a notification and
/// returns without waiting for the notifier.
#[derive(Clone, Debug)]
pub struct DeliveryHandle {
  pub tx: mpsc::Sender<PendingNotification>,
}

impl DeliveryHandle {
  /// Create a new handle from a sender
  pub fn new(tx: mpsc::Sender<PendingNotification>) -> Self {
    Self { tx }
  }

  /// Queue one line for real-time delivery
  pub async fn forward(&self, file_name: &str, line: String) -> Result<(), SendError> {
    let pending = PendingNotification {
      file_name: file_name.to_string(),
      line,
    };
    self.tx.send(pending).await.map_err(|_| SendError::ActorGone)
  }
}

// ============================================================================
// Errors
// ============================================================================

/// Error when sending to an actor
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
  #[error("Actor has shut down")]
  ActorGone,
}
