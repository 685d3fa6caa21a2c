use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, info, trace, warn};

use super::{ChatId, DeliveryError, Notifier, Recipient};
use crate::domain::config::TelegramConfig;

/// Thin client over the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramClient {
  client: reqwest::Client,
  base: String,
  poll_timeout: Duration,
}

impl TelegramClient {
  pub fn new(config: &TelegramConfig) -> Result<Self, DeliveryError> {
    let Some(token) = config.resolve_token() else {
      return Err(DeliveryError::NoToken);
    };

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(
        config.request_timeout_secs.max(config.poll_timeout_secs.saturating_add(10)),
      ))
      .build()?;

    info!(api_url = %config.api_url, "Telegram client initialized");

    Ok(Self {
      client,
      base: format!("{}/bot{}", config.api_url.trim_end_matches('/'), token),
      poll_timeout: Duration::from_secs(config.poll_timeout_secs),
    })
  }

  /// Send an HTML-formatted message to `chat`.
  pub async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError> {
    let request = SendMessageRequest {
      chat_id: chat,
      text,
      parse_mode: "HTML",
    };

    let _: serde_json::Value = self.call("sendMessage", &request).await?;
    Ok(())
  }

  /// Long-poll for updates after `offset`.
  pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, DeliveryError> {
    let request = GetUpdatesRequest {
      offset,
      timeout: self.poll_timeout.as_secs(),
      allowed_updates: &["message"],
    };
    self.call("getUpdates", &request).await
  }

  async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, DeliveryError>
  where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
  {
    let url = format!("{}/{}", self.base, method);
    let start = Instant::now();

    let response = match self.client.post(&url).json(body).send().await {
      Ok(resp) => resp,
      Err(e) if e.is_timeout() => return Err(DeliveryError::Timeout),
      Err(e) => {
        // reqwest includes the URL in its message; the URL carries the token
        return Err(DeliveryError::Api(format!("{} request failed: {}", method, e.without_url())));
      }
    };

    let status = response.status();
    trace!(method, status = %status, elapsed_ms = start.elapsed().as_millis(), "Telegram response");

    let envelope: ApiResponse<R> = response
      .json()
      .await
      .map_err(|e| DeliveryError::Request(e.without_url()))?;
    envelope.into_result(method, status)
  }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
  chat_id: ChatId,
  text: &'a str,
  parse_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
  offset: i64,
  timeout: u64,
  allowed_updates: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
  ok: bool,
  result: Option<T>,
  description: Option<String>,
}

impl<T> ApiResponse<T> {
  fn into_result(self, method: &str, status: reqwest::StatusCode) -> Result<T, DeliveryError> {
    match (self.ok, self.result) {
      (true, Some(result)) => Ok(result),
      (true, None) => Err(DeliveryError::Api(format!("{} returned no result", method))),
      (false, _) => {
        let description = self.description.unwrap_or_else(|| "unknown error".to_string());
        if status.as_u16() == 401 || status.as_u16() == 404 {
          error!(method, status = %status, "Telegram authentication failed");
        } else {
          warn!(method, status = %status, description = %description, "Telegram API call failed");
        }
        Err(DeliveryError::Api(format!("{} ({}): {}", method, status, description)))
      }
    }
  }
}

/// One entry from getUpdates. Only text messages are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
  pub update_id: i64,
  #[serde(default)]
  pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
  pub chat: Chat,
  #[serde(default)]
  pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
  pub id: ChatId,
}

/// A recognised chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
  Start,
  Help,
  Status,
  Get,
}

impl BotCommand {
  /// Parse "/status", "/status@my_bot", "/help extra words".
  pub fn parse(text: &str) -> Option<Self> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    match name.to_ascii_lowercase().as_str() {
      "start" => Some(Self::Start),
      "help" => Some(Self::Help),
      "status" => Some(Self::Status),
      "get" => Some(Self::Get),
      _ => None,
    }
  }
}

impl Update {
  /// The chat and command carried by this update, if any.
  pub fn command(&self) -> Option<(ChatId, BotCommand)> {
    let message = self.message.as_ref()?;
    let command = BotCommand::parse(message.text.as_deref()?)?;
    Some((message.chat.id, command))
  }
}

/// Notifier that sends to whichever chat the [`Recipient`] currently holds.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
  client: TelegramClient,
  recipient: Recipient,
}

impl TelegramNotifier {
  pub fn new(client: TelegramClient, recipient: Recipient) -> Self {
    Self { client, recipient }
  }
}

#[async_trait]
impl Notifier for TelegramNotifier {
  fn name(&self) -> &str {
    "telegram"
  }

  fn is_ready(&self) -> bool {
    self.recipient.is_set()
  }

  async fn notify(&self, text: &str) -> Result<(), DeliveryError> {
    let Some(chat) = self.recipient.get() else {
      debug!("No recipient registered yet, dropping message");
      return Ok(());
    };
    self.client.send_message(chat, text).await
  }
}
