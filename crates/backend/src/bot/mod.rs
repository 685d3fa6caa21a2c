//! Chat command surface
//!
//! Answers `/start`, `/get`, `/help` and `/status` from Telegram. `/start` is
//! also how a chat registers itself as the notification recipient when none
//! is configured.

mod commands;
mod poller;
mod status;

pub use commands::respond;
pub use poller::CommandPoller;
pub use status::{FileStatus, StatusReport, collect_status, render_html, render_plain};
