use relay_config::TelegramConfig;
use relay_error::RelayResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::types::{ApiResponse, BotUser, SendMessageRequest, SentMessage};

/// HTML is the formatting used by the upstream producers of event text
const PARSE_MODE: &str = "HTML";

/// Thin Bot API client over `reqwest`
///
/// The method URL embeds the bot token, so URLs are never logged.
#[derive(Clone)]
pub struct BotClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl BotClient {
    pub fn new(config: &TelegramConfig) -> RelayResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.token
            ),
        })
    }

    /// Identify the bot; used at startup to validate the token
    pub async fn get_me(&self) -> RelayResult<BotUser> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Send a silent HTML message and return the platform message id
    pub async fn send_message(&self, chat_id: i64, text: &str) -> RelayResult<i64> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: PARSE_MODE,
            disable_notification: true,
        };

        let sent: SentMessage = self.call("sendMessage", &request).await?;
        Ok(sent.message_id)
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> RelayResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);

        // Transport errors would otherwise print the URL, and with it the token.
        let response = self
            .http_client
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();

        // Error replies (including 429) carry a JSON body; decode it regardless of status.
        let reply: ApiResponse<R> = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;

        debug!(method, status = %status, ok = reply.ok, "Bot API call finished");
        reply.into_result()
    }
}
