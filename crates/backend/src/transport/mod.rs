mod recipient;
mod telegram;

pub use recipient::{ChatId, Recipient};
pub use telegram::{BotCommand, TelegramClient, TelegramNotifier, Update};

/// Outbound delivery capability.
///
/// Every message the daemon produces, real-time or digest, goes through one
/// notifier. Implementations must not panic on failure; they return a
/// [`DeliveryError`] and the caller decides whether to log or keep state.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
  fn name(&self) -> &str;

  /// Whether a destination is known. Deliveries made while this is false are
  /// silently dropped.
  fn is_ready(&self) -> bool {
    true
  }

  async fn notify(&self, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
  #[error("No bot token configured")]
  NoToken,
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Telegram API error: {0}")]
  Api(String),
  #[error("Request timed out")]
  Timeout,
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      _ => escaped.push(ch),
    }
  }
  escaped
}

/// Message for one line forwarded in real time.
pub fn format_realtime(file_name: &str, line: &str) -> String {
  format!("<b>[{}] new entry:</b>\n{}", escape_html(file_name), escape_html(line))
}

/// Message for one chunk of a digest.
pub fn format_digest_chunk(chunk: &str) -> String {
  format!("<b>Daily report:</b>\n<pre>{}</pre>", escape_html(chunk))
}

/// Diagnostic sent when a digest cycle fails.
pub fn format_failure(error: &dyn std::fmt::Display) -> String {
  format!("<b>An error occurred:</b>\n<code>{}</code>", escape_html(&error.to_string()))
}
