//! Message router.
//!
//! Takes one parsed queue payload for the bound queue kind and:
//! 1. Selects the intent via `DecoderRegistry`
//! 2. Dispatches it to the matching channel adapter
//! 3. Reports a `RouteOutcome` so the poller can settle the queue message
//!
//! Every outcome here is final for the message. Channel failures are logged
//! and reported, never retried by re-queueing.

use std::sync::Arc;

use serde_json::Value;

use relay_common::error::AppError;
use relay_common::types::{QueueKind, RoutedIntent, SkipReason};
use relay_decoders::DecoderRegistry;
use relay_notifier::{InstantMessenger, Mailer, SendOptions, TeamChat};

use crate::confirmation::ConfirmationFlow;

/// Result of routing one payload.
#[derive(Debug)]
pub enum RouteOutcome {
    /// The adapter accepted the message. Carries the intent label.
    Delivered(&'static str),
    /// The adapter was called and returned an error.
    Failed {
        intent: &'static str,
        error: AppError,
    },
    /// No adapter was called.
    Skipped(SkipReason),
}

impl RouteOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, RouteOutcome::Delivered(_))
    }
}

/// Routes decoded intents to whichever adapters this process was built with.
#[derive(Default)]
pub struct MessageRouter {
    decoders: DecoderRegistry,
    instant: Option<Arc<dyn InstantMessenger>>,
    mail: Option<Arc<dyn Mailer>>,
    team_chat: Option<Arc<dyn TeamChat>>,
    confirmations: Option<Arc<ConfirmationFlow>>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instant(mut self, messenger: Arc<dyn InstantMessenger>) -> Self {
        self.instant = Some(messenger);
        self
    }

    pub fn with_mail(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mail = Some(mailer);
        self
    }

    /// Attach a team-chat adapter and the confirmation flow that drives its prompts.
    pub fn with_team_chat(mut self, team_chat: Arc<dyn TeamChat>) -> Self {
        self.confirmations = Some(Arc::new(ConfirmationFlow::new(team_chat.clone())));
        self.team_chat = Some(team_chat);
        self
    }

    /// Shared with the interaction webhook so both sides see the same prompts.
    pub fn confirmations(&self) -> Option<Arc<ConfirmationFlow>> {
        self.confirmations.clone()
    }

    /// Decode and dispatch one parsed payload.
    pub async fn route(&self, kind: QueueKind, payload: &Value) -> RouteOutcome {
        let intent = match self.decoders.decode(kind, payload) {
            Ok(intent) => intent,
            Err(reason) => {
                tracing::warn!(queue_kind = %kind, reason = %reason, "Payload skipped");
                return RouteOutcome::Skipped(reason);
            }
        };

        let label = intent.label();
        let outcome = match self.dispatch(intent).await {
            Ok(()) => RouteOutcome::Delivered(label),
            Err(Dispatch::Unavailable(channel)) => {
                RouteOutcome::Skipped(SkipReason::ChannelUnavailable(channel))
            }
            Err(Dispatch::Failed(error)) => RouteOutcome::Failed {
                intent: label,
                error,
            },
        };

        match &outcome {
            RouteOutcome::Delivered(intent) => {
                tracing::info!(queue_kind = %kind, intent, "Message delivered");
            }
            RouteOutcome::Failed { intent, error } => {
                tracing::error!(queue_kind = %kind, intent, error = %error, "Message delivery failed");
            }
            RouteOutcome::Skipped(reason) => {
                tracing::warn!(queue_kind = %kind, intent = label, reason = %reason, "Message skipped");
            }
        }

        outcome
    }

    async fn dispatch(&self, intent: RoutedIntent) -> Result<(), Dispatch> {
        match intent {
            RoutedIntent::InstantMessage { chat_id, text } => {
                let messenger = self.instant.as_ref().ok_or(Dispatch::Unavailable("telegram"))?;
                messenger
                    .send_text(&chat_id, &text, &SendOptions::default())
                    .await?;
            }
            RoutedIntent::Email(mail) => {
                let mailer = self.mail.as_ref().ok_or(Dispatch::Unavailable("email"))?;
                mailer.send_email(&mail).await?;
            }
            RoutedIntent::TeamChatDirect {
                user_name,
                user_id,
                text,
            } => {
                let team_chat = self.team_chat.as_ref().ok_or(Dispatch::Unavailable("slack"))?;
                team_chat
                    .send_direct(&user_name, user_id.as_deref(), &text)
                    .await?;
            }
            RoutedIntent::TeamChatGroup { channel_id, text } => {
                let team_chat = self.team_chat.as_ref().ok_or(Dispatch::Unavailable("slack"))?;
                team_chat.send_group(&channel_id, &text).await?;
            }
            RoutedIntent::TeamChatConfirm(request) => {
                let flow = self
                    .confirmations
                    .as_ref()
                    .ok_or(Dispatch::Unavailable("slack"))?;
                flow.open(&request).await?;
            }
        }
        Ok(())
    }
}

enum Dispatch {
    Unavailable(&'static str),
    Failed(AppError),
}

impl From<AppError> for Dispatch {
    fn from(error: AppError) -> Self {
        Dispatch::Failed(error)
    }
}
