// ============================================================================
// Telegram Configuration
// ============================================================================

use crate::constants::*;
use crate::{parse_var, require_var};

/// Bot API credentials and the per-language destination channels
#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub ru_channel: i64,
    pub es_channel: i64,
    /// Bot API base URL, overridable for self-hosted API servers
    pub api_url: String,
    pub request_timeout_secs: u64,
}

impl TelegramConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let ru_channel = require_var("TELEGRAM_RU_CHANNEL")?;
        let es_channel = require_var("TELEGRAM_ES_CHANNEL")?;

        Ok(Self {
            token: require_var("TELEGRAM_TOKEN")?,
            ru_channel: ru_channel.parse().map_err(|_| {
                anyhow::anyhow!("TELEGRAM_RU_CHANNEL must be an integer, got {:?}", ru_channel)
            })?,
            es_channel: es_channel.parse().map_err(|_| {
                anyhow::anyhow!("TELEGRAM_ES_CHANNEL must be an integer, got {:?}", es_channel)
            })?,
            api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| DEFAULT_TELEGRAM_API_URL.to_string()),
            request_timeout_secs: parse_var(
                "TELEGRAM_REQUEST_TIMEOUT_SECS",
                DEFAULT_TELEGRAM_REQUEST_TIMEOUT_SECS,
            )?,
        })
    }
}

// The token grants full control of the bot; keep it out of Debug output.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"***")
            .field("ru_channel", &self.ru_channel)
            .field("es_channel", &self.es_channel)
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
