//! Telegram Bot API adapter.

use async_trait::async_trait;
use serde_json::json;

use relay_common::error::AppError;

use crate::{InstantMessenger, ParseMode, SendOptions};

/// Sends messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, api_base: impl Into<String>) -> Self {
        Self {
            bot_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl InstantMessenger for TelegramNotifier {
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), AppError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if options.parse_mode == ParseMode::MarkdownV2 {
            body["parse_mode"] = json!("MarkdownV2");
        }

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail: serde_json::Value = response.json().await.unwrap_or_default();
            let description = detail
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("no description");
            return Err(AppError::channel(
                "telegram",
                format!("sendMessage failed ({}): {}", status, description),
            ));
        }

        tracing::info!(chat_id, "Message sent to Telegram chat");
        Ok(())
    }
}
