//! Actor message types for the daemon architecture
//!
//! ```text
//! notify thread ──(notify::Event)──▶ WatcherTask ──(PendingNotification)──▶ DeliveryActor ──▶ Notifier
//! ```
//!
//! Both channels are bounded. Order is preserved on each, so lines from one
//! read of the watched file reach the notifier in file order.

/// One line forwarded in real time, queued for the delivery actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
  /// Base name of the file the line came from
  pub file_name: String,
  /// Trimmed line content
  pub line: String,
}
