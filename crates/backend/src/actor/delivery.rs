//! DeliveryActor - real-time notification sender
//!
//! Consumes [`PendingNotification`]s in the order the watcher queued them and
//! hands each one to the [`Notifier`]. One actor, one queue: notifications from
//! the same read of the watched file are never reordered.
//!
//! Delivery is at-most-once per queued notification. A failed send is logged
//! and dropped; there is no outbound retry queue.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{handle::DeliveryHandle, message::PendingNotification};
use crate::{
  domain::line::{DEFAULT_CHUNK_SIZE, chunk_text},
  transport::{Notifier, format_realtime},
};

pub struct DeliveryActor {
  notifier: Arc<dyn Notifier>,
  rx: mpsc::Receiver<PendingNotification>,
  cancel: CancellationToken,
}

impl DeliveryActor {
  pub fn new(notifier: Arc<dyn Notifier>, rx: mpsc::Receiver<PendingNotification>, cancel: CancellationToken) -> Self {
    Self { notifier, rx, cancel }
  }

  /// Spawn the actor and return a handle plus its join handle
  pub fn spawn(
    notifier: Arc<dyn Notifier>,
    buffer: usize,
    cancel: CancellationToken,
  ) -> (DeliveryHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let actor = Self::new(notifier, rx, cancel);
    (DeliveryHandle::new(tx), tokio::spawn(actor.run()))
  }

  /// Main actor loop
  ///
  /// Runs until the `CancellationToken` is cancelled or every handle is dropped.
  pub async fn run(mut self) {
    info!(notifier = self.notifier.name(), "DeliveryActor started");

    loop {
      tokio::select! {
          biased;

          _ = self.cancel.cancelled() => {
              info!("DeliveryActor shutting down (cancelled)");
              break;
          }

          pending = self.rx.recv() => {
              match pending {
                  Some(pending) => self.deliver(pending).await,
                  None => {
                      info!("DeliveryActor shutting down (channel closed)");
                      break;
                  }
              }
          }
      }
    }

    info!("DeliveryActor stopped");
  }

  /// Send one line, split into consecutive chunks when it is too long for a
  /// single message. A failed chunk drops the rest of the line.
  async fn deliver(&self, pending: PendingNotification) {
    let chunks = chunk_text(&pending.line, DEFAULT_CHUNK_SIZE);
    let total = chunks.len();

    for (i, chunk) in chunks.into_iter().enumerate() {
      let text = format_realtime(&pending.file_name, chunk);
      if let Err(e) = self.notifier.notify(&text).await {
        warn!(
          file = %pending.file_name,
          chunk = i + 1,
          total,
          error = %e,
          "Failed to deliver new entry, dropping it"
        );
        return;
      }
    }

    debug!(file = %pending.file_name, chunks = total, "Delivered new entry");
  }
}
