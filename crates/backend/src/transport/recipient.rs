//! Who receives notifications.
//!
//! The recipient starts out either configured or unset. It can be set later
//! by the command surface (`/start`), and every reader sees the change on its
//! next delivery.

use tokio::sync::watch;

pub type ChatId = i64;

/// Shared, cheaply cloned recipient slot.
#[derive(Debug, Clone)]
pub struct Recipient {
  tx: watch::Sender<Option<ChatId>>,
}

impl Recipient {
  pub fn new(initial: Option<ChatId>) -> Self {
    let (tx, _rx) = watch::channel(initial);
    Self { tx }
  }

  pub fn unset() -> Self {
    Self::new(None)
  }

  pub fn get(&self) -> Option<ChatId> {
    *self.tx.borrow()
  }

  pub fn is_set(&self) -> bool {
    self.get().is_some()
  }

  /// Register a chat. Returns true if the recipient changed.
  pub fn set(&self, chat: ChatId) -> bool {
    self.tx.send_if_modified(|current| {
      if *current == Some(chat) {
        false
      } else {
        *current = Some(chat);
        true
      }
    })
  }
}
