// Telegram Bot API client
//
// Only the calls the relay needs: token validation at startup and silent
// HTML message sends.

pub mod client;
pub mod types;

pub use client::BotClient;
pub use types::{BotUser, SentMessage};
