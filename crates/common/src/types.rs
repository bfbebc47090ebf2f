use serde::{Deserialize, Serialize};

/// The logical channel a relay process is bound to for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    InstantMessage,
    Email,
    TeamChat,
}

impl QueueKind {
    /// Name of the Redis list this kind is bound to by default.
    pub fn default_queue_name(&self) -> &'static str {
        match self {
            QueueKind::InstantMessage => "tg_queue",
            QueueKind::Email => "email_queue",
            QueueKind::TeamChat => "slack_queue",
        }
    }

    /// Resolve a queue kind from the deployment-time queue name.
    pub fn from_queue_name(name: &str) -> Option<Self> {
        match name.trim() {
            "tg_queue" | "telegram" | "instant_message" => Some(QueueKind::InstantMessage),
            "email_queue" | "email" => Some(QueueKind::Email),
            "slack_queue" | "slack" | "team_chat" => Some(QueueKind::TeamChat),
            _ => None,
        }
    }
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::InstantMessage => write!(f, "instant_message"),
            QueueKind::Email => write!(f, "email"),
            QueueKind::TeamChat => write!(f, "team_chat"),
        }
    }
}

/// Outbound email selected from an email-queue payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailIntent {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    /// Overrides the configured sender address when present.
    pub sender: Option<String>,
}

/// Parameters for a team-chat confirm/cancel prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub user_id: String,
    pub text: String,
    pub channel_id: Option<String>,
    pub subgroup_id: Option<String>,
}

/// The payload fields selected for one specific channel operation.
///
/// Created per queue message and discarded after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum RoutedIntent {
    InstantMessage {
        chat_id: String,
        text: String,
    },
    Email(EmailIntent),
    TeamChatDirect {
        user_name: String,
        user_id: Option<String>,
        text: String,
    },
    TeamChatGroup {
        channel_id: String,
        text: String,
    },
    TeamChatConfirm(ConfirmRequest),
}

impl RoutedIntent {
    /// Short label used in log fields.
    pub fn label(&self) -> &'static str {
        match self {
            RoutedIntent::InstantMessage { .. } => "instant_message",
            RoutedIntent::Email(_) => "email",
            RoutedIntent::TeamChatDirect { .. } => "team_chat_direct",
            RoutedIntent::TeamChatGroup { .. } => "team_chat_group",
            RoutedIntent::TeamChatConfirm(_) => "team_chat_confirm",
        }
    }
}

/// Why a decoded payload produced no dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The payload parsed but was not a JSON object.
    NotAnObject,
    /// A required field was absent, null, or empty.
    MissingField(&'static str),
    /// The team-chat discriminator named no known operation.
    UnsupportedType(String),
    /// No adapter is configured for the decoded intent.
    ChannelUnavailable(&'static str),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotAnObject => write!(f, "payload is not an object"),
            SkipReason::MissingField(field) => write!(f, "missing required field '{}'", field),
            SkipReason::UnsupportedType(t) => write!(f, "unsupported message type '{}'", t),
            SkipReason::ChannelUnavailable(c) => write!(f, "{} channel is not configured", c),
        }
    }
}

/// Identifies one posted team-chat message: the confirmation correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: String,
    pub ts: String,
}

impl std::fmt::Display for MessageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.ts)
    }
}
