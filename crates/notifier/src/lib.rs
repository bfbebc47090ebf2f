//! Channel adapters.
//!
//! Each adapter wraps one external communication API behind a narrow trait so
//! the router and the digest composer never see vendor details:
//! - `InstantMessenger`: Telegram Bot API
//! - `Mailer`: SMTP via lettre
//! - `TeamChat`: Slack Web API
//!
//! Adapters are constructed once at startup and shared by `Arc`.

pub mod blocks;
pub mod email;
pub mod retry;
pub mod slack;
pub mod telegram;

use async_trait::async_trait;
use serde_json::Value;

use relay_common::error::AppError;
use relay_common::types::{ConfirmRequest, EmailIntent, MessageRef};

/// Text formatting mode for instant messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Plain,
    MarkdownV2,
}

/// Per-send options for instant messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub parse_mode: ParseMode,
}

impl SendOptions {
    pub fn markdown_v2() -> Self {
        Self {
            parse_mode: ParseMode::MarkdownV2,
        }
    }
}

#[async_trait]
pub trait InstantMessenger: Send + Sync {
    /// Send `text` to `chat_id`.
    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), AppError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, mail: &EmailIntent) -> Result<(), AppError>;
}

#[async_trait]
pub trait TeamChat: Send + Sync {
    /// Send a direct message, resolving the user id by name when not given.
    ///
    /// Returns `AppError::NotFound` when no user matches `user_name`.
    async fn send_direct(
        &self,
        user_name: &str,
        user_id: Option<&str>,
        text: &str,
    ) -> Result<(), AppError>;

    async fn send_group(&self, channel_id: &str, text: &str) -> Result<(), AppError>;

    /// Post an interactive confirm/cancel prompt and return where it landed.
    async fn send_confirmation(&self, request: &ConfirmRequest) -> Result<MessageRef, AppError>;

    /// Rewrite a posted message. An empty `blocks` slice removes all interactive elements.
    async fn update_message(
        &self,
        message: &MessageRef,
        text: &str,
        blocks: &[Value],
    ) -> Result<(), AppError>;

    /// Show `text` to a single user only.
    async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<(), AppError>;
}
