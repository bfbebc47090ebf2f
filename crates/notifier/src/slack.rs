//! Slack Web API adapter.
//!
//! Talks to the Web API directly over HTTPS with the bot token. Every user
//! lookup is a live `users.list` call; nothing is cached between messages.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde_json::{Value, json};

use relay_common::error::AppError;
use relay_common::types::{ConfirmRequest, MessageRef};

use crate::TeamChat;
use crate::blocks::{PROMPT_FALLBACK_TEXT, confirmation_prompt};
use crate::retry::RetryPolicy;

/// Page size for `users.list`.
const USERS_PAGE_LIMIT: &str = "200";

pub struct SlackNotifier {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
    lookup_retry: RetryPolicy,
}

impl SlackNotifier {
    pub fn new(bot_token: String, api_base: impl Into<String>, lookup_retry: RetryPolicy) -> Self {
        Self {
            bot_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            lookup_retry,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base)
    }

    async fn post(&self, method: &str, body: Value) -> Result<Value, AppError> {
        let response = self
            .client
            .post(self.api_url(method))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await?;

        read_response(method, response).await
    }

    async fn get(&self, method: &str, query: &[(&str, &str)]) -> Result<Value, AppError> {
        let response = self
            .client
            .get(self.api_url(method))
            .bearer_auth(&self.bot_token)
            .query(query)
            .send()
            .await?;

        read_response(method, response).await
    }

    /// Resolve a user id by handle, real name or display name.
    ///
    /// Walks every `users.list` page; each page call gets the bounded
    /// rate-limit retry.
    pub async fn find_user_id(&self, user_name: &str) -> Result<Option<String>, AppError> {
        let mut cursor = String::new();

        loop {
            let page = self
                .lookup_retry
                .run("users.list", || {
                    let mut query = vec![("limit", USERS_PAGE_LIMIT)];
                    if !cursor.is_empty() {
                        query.push(("cursor", cursor.as_str()));
                    }
                    async move { self.get("users.list", &query).await }
                })
                .await?;

            let members = page
                .get("members")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            if let Some(id) = members
                .iter()
                .find(|member| member_matches(member, user_name))
                .and_then(|member| member.get("id"))
                .and_then(Value::as_str)
            {
                return Ok(Some(id.to_string()));
            }

            cursor = page
                .pointer("/response_metadata/next_cursor")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            if cursor.is_empty() {
                return Ok(None);
            }
        }
    }

    async fn open_conversation(&self, user_id: &str) -> Result<String, AppError> {
        let response = self
            .post("conversations.open", json!({ "users": user_id }))
            .await?;

        response
            .pointer("/channel/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::channel("slack", "conversations.open returned no channel id"))
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        blocks: Option<&[Value]>,
    ) -> Result<MessageRef, AppError> {
        let mut body = json!({ "channel": channel, "text": text });
        if let Some(blocks) = blocks {
            body["blocks"] = Value::Array(blocks.to_vec());
        }

        let response = self.post("chat.postMessage", body).await?;

        let channel_id = response
            .get("channel")
            .and_then(Value::as_str)
            .unwrap_or(channel)
            .to_string();
        let ts = response
            .get("ts")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::channel("slack", "chat.postMessage returned no ts"))?
            .to_string();

        Ok(MessageRef { channel_id, ts })
    }
}

fn member_matches(member: &Value, user_name: &str) -> bool {
    ["/name", "/real_name", "/profile/display_name"]
        .iter()
        .filter_map(|path| member.pointer(path).and_then(Value::as_str))
        .any(|candidate| candidate == user_name)
}

/// Map a Web API response to its JSON body or a typed error.
///
/// Rate limiting shows up either as HTTP 429 with `Retry-After` or as
/// `{"ok": false, "error": "ratelimited"}`.
async fn read_response(method: &str, response: reqwest::Response) -> Result<Value, AppError> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);
        return Err(AppError::RateLimited { retry_after_secs });
    }

    let body: Value = response.json().await?;
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(body);
    }

    match body.get("error").and_then(Value::as_str) {
        Some("ratelimited") => Err(AppError::RateLimited { retry_after_secs: 1 }),
        Some(error) => Err(AppError::channel("slack", format!("{method}: {error}"))),
        None => Err(AppError::channel("slack", format!("{method}: unknown error"))),
    }
}

#[async_trait]
impl TeamChat for SlackNotifier {
    async fn send_direct(
        &self,
        user_name: &str,
        user_id: Option<&str>,
        text: &str,
    ) -> Result<(), AppError> {
        let user_id = match user_id {
            Some(id) => id.to_string(),
            None => self
                .find_user_id(user_name)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Slack user '{}'", user_name)))?,
        };

        let channel = self.open_conversation(&user_id).await?;
        self.post_message(&channel, text, None).await?;

        tracing::info!(user_name, user_id = %user_id, "Direct message sent");
        Ok(())
    }

    async fn send_group(&self, channel_id: &str, text: &str) -> Result<(), AppError> {
        self.post_message(channel_id, text, None).await?;

        tracing::info!(channel_id, "Message sent to the group");
        Ok(())
    }

    async fn send_confirmation(&self, request: &ConfirmRequest) -> Result<MessageRef, AppError> {
        let blocks = confirmation_prompt(&request.text, &request.user_id);
        let message = self
            .post_message(&request.user_id, PROMPT_FALLBACK_TEXT, Some(&blocks))
            .await?;

        tracing::info!(
            user_id = %request.user_id,
            message = %message,
            "Confirmation prompt sent"
        );
        Ok(message)
    }

    async fn update_message(
        &self,
        message: &MessageRef,
        text: &str,
        blocks: &[Value],
    ) -> Result<(), AppError> {
        self.post(
            "chat.update",
            json!({
                "channel": message.channel_id,
                "ts": message.ts,
                "text": text,
                "blocks": blocks,
            }),
        )
        .await?;
        Ok(())
    }

    async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<(), AppError> {
        self.post(
            "chat.postEphemeral",
            json!({ "channel": channel_id, "user": user_id, "text": text }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Duration;

    fn notifier(server: &mockito::Server) -> SlackNotifier {
        let retry = RetryPolicy::new(2)
            .with_delays(Duration::from_millis(1), Duration::from_millis(5));
        SlackNotifier::new("xoxb-test".to_string(), server.url(), retry)
    }

    #[tokio::test]
    async fn test_find_user_id_walks_pages_and_matches_real_name() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/users.list")
            .match_query(Matcher::Regex("^limit=200$".into()))
            .match_header("authorization", "Bearer xoxb-test")
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "members": [{ "id": "U1", "name": "taras", "real_name": "Taras K" }],
                    "response_metadata": { "next_cursor": "abc" }
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/users.list")
            .match_query(Matcher::UrlEncoded("cursor".into(), "abc".into()))
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "members": [{ "id": "U2", "name": "olena.p", "real_name": "Olena Petrenko" }],
                    "response_metadata": { "next_cursor": "" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let slack = notifier(&server);
        let id = slack.find_user_id("Olena Petrenko").await.unwrap();

        assert_eq!(id.as_deref(), Some("U2"));
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_find_user_id_unknown_user() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users.list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ok":true,"members":[{"id":"U1","name":"taras"}]}"#)
            .create_async()
            .await;

        let slack = notifier(&server);
        assert_eq!(slack.find_user_id("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_exhausts_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users.list")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header("retry-after", "0")
            .expect(2)
            .create_async()
            .await;

        let slack = notifier(&server);
        let err = slack.find_user_id("olena").await.unwrap_err();

        assert!(matches!(err, AppError::RateLimitExhausted { attempts: 2 }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_direct_with_known_id_skips_lookup() {
        let mut server = mockito::Server::new_async().await;
        let lookup = server
            .mock("GET", "/users.list")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let open = server
            .mock("POST", "/conversations.open")
            .match_body(Matcher::Json(json!({ "users": "U42" })))
            .with_status(200)
            .with_body(r#"{"ok":true,"channel":{"id":"D42"}}"#)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/chat.postMessage")
            .match_body(Matcher::Json(json!({ "channel": "D42", "text": "ping" })))
            .with_status(200)
            .with_body(r#"{"ok":true,"channel":"D42","ts":"1700000000.000100"}"#)
            .create_async()
            .await;

        let slack = notifier(&server);
        slack.send_direct("olena", Some("U42"), "ping").await.unwrap();

        lookup.assert_async().await;
        open.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_direct_unknown_user_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _lookup = server
            .mock("GET", "/users.list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ok":true,"members":[]}"#)
            .create_async()
            .await;

        let slack = notifier(&server);
        let err = slack.send_direct("ghost", None, "ping").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_send_confirmation_returns_message_ref() {
        let mut server = mockito::Server::new_async().await;
        let post = server
            .mock("POST", "/chat.postMessage")
            .match_body(Matcher::PartialJson(json!({
                "channel": "U1",
                "text": PROMPT_FALLBACK_TEXT
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"channel":"D1","ts":"1700000000.000200"}"#)
            .create_async()
            .await;

        let slack = notifier(&server);
        let request = ConfirmRequest {
            user_id: "U1".to_string(),
            text: "Shift tomorrow?".to_string(),
            channel_id: None,
            subgroup_id: None,
        };
        let message = slack.send_confirmation(&request).await.unwrap();

        assert_eq!(
            message,
            MessageRef {
                channel_id: "D1".to_string(),
                ts: "1700000000.000200".to_string(),
            }
        );
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_is_channel_error() {
        let mut server = mockito::Server::new_async().await;
        let _post = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok":false,"error":"channel_not_found"}"#)
            .create_async()
            .await;

        let slack = notifier(&server);
        let err = slack.send_group("C404", "hello").await.unwrap_err();
        assert!(err.to_string().contains("chat.postMessage: channel_not_found"));
    }
}
