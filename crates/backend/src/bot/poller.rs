//! CommandPoller - long-polls Telegram for chat commands
//!
//! Runs on the same runtime as the delivery and digest tasks. Each update is
//! answered in order; a failed poll is retried after a short backoff.

use std::{path::PathBuf, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::commands::respond;
use crate::transport::{Recipient, TelegramClient, Update};

const RETRY_BACKOFF: Duration = Duration::from_secs(5);

pub struct CommandPoller {
  client: TelegramClient,
  recipient: Recipient,
  directory: PathBuf,
  chunk_size: usize,
  offset: i64,
}

impl CommandPoller {
  pub fn new(client: TelegramClient, recipient: Recipient, directory: PathBuf, chunk_size: usize) -> Self {
    Self {
      client,
      recipient,
      directory,
      chunk_size,
      offset: 0,
    }
  }

  /// Poll until cancelled.
  pub async fn run(mut self, cancel: CancellationToken) {
    info!(directory = %self.directory.display(), "Command poller started");

    loop {
      tokio::select! {
          biased;

          _ = cancel.cancelled() => {
              info!("Command poller shutting down (cancelled)");
              break;
          }

          result = self.client.get_updates(self.offset) => {
              match result {
                  Ok(updates) => self.handle_updates(updates).await,
                  Err(e) => {
                      warn!(error = %e, "Failed to fetch updates, retrying");
                      tokio::select! {
                          _ = cancel.cancelled() => break,
                          _ = tokio::time::sleep(RETRY_BACKOFF) => {}
                      }
                  }
              }
          }
      }
    }

    info!("Command poller stopped");
  }

  async fn handle_updates(&mut self, updates: Vec<Update>) {
    for update in updates {
      self.offset = self.offset.max(update.update_id + 1);

      let Some((chat, command)) = update.command() else {
        continue;
      };
      debug!(chat, ?command, "Received command");

      let replies = respond(command, chat, &self.recipient, &self.directory, self.chunk_size).await;
      for reply in replies {
        if let Err(e) = self.client.send_message(chat, &reply).await {
          warn!(chat, error = %e, "Failed to send command reply");
          break;
        }
      }
    }
  }
}
