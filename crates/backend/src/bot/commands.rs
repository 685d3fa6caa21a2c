use std::path::Path;

use tracing::{info, warn};

use super::status::{collect_status, render_html};
use crate::transport::{BotCommand, ChatId, Recipient, escape_html};

const HELP_TEXT: &str = "<b>Commands:</b>\n\
/start - Start receiving notifications\n\
/status - Files and their entries\n\
/get - Show this chat's ID\n\
/help - Help";

const START_TEXT: &str = "👋 Hello! The monitoring bot is running. New entries will be sent to you automatically.\n\
Send /help for the list of commands.";

/// Replies for one command sent from `chat`.
///
/// `/start` registers `chat` as the recipient when none is set yet. A
/// recipient fixed in configuration is never replaced.
pub async fn respond(
  command: BotCommand,
  chat: ChatId,
  recipient: &Recipient,
  directory: &Path,
  chunk_size: usize,
) -> Vec<String> {
  match command {
    BotCommand::Start => {
      if !recipient.is_set() && recipient.set(chat) {
        info!(chat, "Registered notification recipient");
      }
      vec![START_TEXT.to_string()]
    }
    BotCommand::Get => vec![format!("Your chat ID: <code>{}</code>", chat)],
    BotCommand::Help => vec![HELP_TEXT.to_string()],
    BotCommand::Status => match collect_status(directory).await {
      Ok(report) => render_html(&report, chunk_size),
      Err(e) => {
        warn!(directory = %directory.display(), error = %e, "Failed to collect status");
        vec![format!(
          "❗ Failed to read the watched folder: <code>{}</code>",
          escape_html(&e.to_string())
        )]
      }
    },
  }
}
