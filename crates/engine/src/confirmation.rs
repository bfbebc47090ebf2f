//! Team-chat confirmation state machine.
//!
//! A confirm/cancel prompt moves through:
//!
//! ```text
//! Pending ──confirm──▶ Confirmed
//!    │
//!    └──cancel──▶ AwaitingReason ──submit(non-empty)──▶ Cancelled
//!                      ▲      │
//!                      └──────┘ submit(empty): ephemeral error
//! ```
//!
//! State lives in-process, keyed by the posted message (`channel_id`, `ts`).
//! The Slack message is only a rendering of that state, and a transition is
//! committed only after its rendering succeeded. Entries are dropped once they
//! reach a terminal state or outlive the store's max age. State does not
//! survive a restart: button clicks on prompts posted by a previous process
//! are ignored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;

use relay_common::error::AppError;
use relay_common::types::{ConfirmRequest, MessageRef};
use relay_notifier::TeamChat;
use relay_notifier::blocks::reason_form;

pub const CONFIRMED_TEXT: &str = "Підтверджено!";
pub const REASON_PROMPT_TEXT: &str = "Яка причина";
pub const REASON_REQUIRED_TEXT: &str = "Яка причина.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationState {
    Pending,
    AwaitingReason,
    Confirmed,
    Cancelled,
}

impl ConfirmationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConfirmationState::Confirmed | ConfirmationState::Cancelled)
    }
}

/// A button press or form submission from the team-chat UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationAction {
    Confirm,
    Cancel,
    SubmitReason { reason: Option<String> },
}

/// What the transition asks the renderer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Rewrite the prompt message. Empty `blocks` strips all interactive elements.
    Rewrite { text: String, blocks: Vec<Value> },
    /// Show `text` to the acting user only.
    Ephemeral { text: String },
    /// The action is not valid in the current state.
    Ignore,
}

/// Pure transition function.
pub fn transition(
    state: ConfirmationState,
    action: &ConfirmationAction,
    actor_id: &str,
) -> (ConfirmationState, Effect) {
    match (state, action) {
        (ConfirmationState::Pending, ConfirmationAction::Confirm) => (
            ConfirmationState::Confirmed,
            Effect::Rewrite {
                text: CONFIRMED_TEXT.to_string(),
                blocks: Vec::new(),
            },
        ),
        (ConfirmationState::Pending, ConfirmationAction::Cancel) => (
            ConfirmationState::AwaitingReason,
            Effect::Rewrite {
                text: REASON_PROMPT_TEXT.to_string(),
                blocks: reason_form(actor_id),
            },
        ),
        (ConfirmationState::AwaitingReason, ConfirmationAction::SubmitReason { reason }) => {
            match reason.as_deref().filter(|r| !r.trim().is_empty()) {
                Some(reason) => (
                    ConfirmationState::Cancelled,
                    Effect::Rewrite {
                        text: format!(
                            "Користувач <@{}> відмінив за причиною: \"{}\"",
                            actor_id, reason
                        ),
                        blocks: Vec::new(),
                    },
                ),
                None => (
                    ConfirmationState::AwaitingReason,
                    Effect::Ephemeral {
                        text: REASON_REQUIRED_TEXT.to_string(),
                    },
                ),
            }
        }
        (state, _) => (state, Effect::Ignore),
    }
}

/// How long an unanswered prompt is remembered.
pub const DEFAULT_PROMPT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A transition computed against the stored state but not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Planned {
    pub from: ConfirmationState,
    pub next: ConfirmationState,
    pub effect: Effect,
}

struct Entry {
    state: ConfirmationState,
    opened_at: Instant,
}

/// In-process confirmation states keyed by posted message.
///
/// Prompts older than `max_age` are pruned whenever a new one is inserted.
pub struct ConfirmationStore {
    states: Mutex<HashMap<MessageRef, Entry>>,
    max_age: Duration,
}

impl Default for ConfirmationStore {
    fn default() -> Self {
        Self::with_max_age(DEFAULT_PROMPT_MAX_AGE)
    }
}

impl ConfirmationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            max_age,
        }
    }

    pub fn insert(&self, message: MessageRef, state: ConfirmationState) {
        let now = Instant::now();
        let mut states = self.lock();

        let before = states.len();
        states.retain(|_, entry| now.duration_since(entry.opened_at) < self.max_age);
        let expired = before - states.len();
        if expired > 0 {
            tracing::info!(expired, "Expired unanswered confirmation prompts");
        }

        states.insert(
            message,
            Entry {
                state,
                opened_at: now,
            },
        );
    }

    pub fn get(&self, message: &MessageRef) -> Option<ConfirmationState> {
        self.lock().get(message).map(|entry| entry.state)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute the transition for an action without changing the store.
    /// Returns `None` for unknown messages.
    pub fn plan(
        &self,
        message: &MessageRef,
        action: &ConfirmationAction,
        actor_id: &str,
    ) -> Option<Planned> {
        let from = self.lock().get(message)?.state;
        let (next, effect) = transition(from, action, actor_id);
        Some(Planned { from, next, effect })
    }

    /// Move `message` from `from` to `next` if it is still in `from`.
    ///
    /// Terminal states are removed rather than stored. Returns `false` when
    /// the prompt is gone or another interaction moved it first.
    pub fn commit(
        &self,
        message: &MessageRef,
        from: ConfirmationState,
        next: ConfirmationState,
    ) -> bool {
        let mut states = self.lock();
        match states.get_mut(message) {
            Some(entry) if entry.state == from => {
                if next.is_terminal() {
                    states.remove(message);
                } else {
                    entry.state = next;
                }
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<MessageRef, Entry>> {
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Inbound interaction addressed to one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionEvent {
    pub message: MessageRef,
    pub actor_id: String,
    pub action: ConfirmationAction,
}

/// Drives prompts: posts them, tracks their state, renders transitions.
pub struct ConfirmationFlow {
    store: ConfirmationStore,
    team_chat: Arc<dyn TeamChat>,
}

impl ConfirmationFlow {
    pub fn new(team_chat: Arc<dyn TeamChat>) -> Self {
        Self {
            store: ConfirmationStore::new(),
            team_chat,
        }
    }

    pub fn store(&self) -> &ConfirmationStore {
        &self.store
    }

    /// Post a prompt and register it as `Pending`.
    pub async fn open(&self, request: &ConfirmRequest) -> Result<MessageRef, AppError> {
        let message = self.team_chat.send_confirmation(request).await?;
        self.store.insert(message.clone(), ConfirmationState::Pending);

        tracing::info!(
            message = %message,
            user_id = %request.user_id,
            subgroup_id = ?request.subgroup_id,
            "Confirmation pending"
        );
        Ok(message)
    }

    /// Render the effect of an interaction, then commit the new state.
    ///
    /// Returns the state after the event, or `None` when the prompt is unknown.
    /// A failed rendering leaves the stored state untouched so the user can
    /// retry.
    pub async fn handle(
        &self,
        event: &InteractionEvent,
    ) -> Result<Option<ConfirmationState>, AppError> {
        let Some(Planned { from, next, effect }) =
            self.store.plan(&event.message, &event.action, &event.actor_id)
        else {
            tracing::warn!(
                message = %event.message,
                action = ?event.action,
                "Interaction for unknown confirmation prompt ignored"
            );
            return Ok(None);
        };

        match effect {
            Effect::Rewrite { text, blocks } => {
                self.team_chat
                    .update_message(&event.message, &text, &blocks)
                    .await?;
            }
            Effect::Ephemeral { text } => {
                self.team_chat
                    .post_ephemeral(&event.message.channel_id, &event.actor_id, &text)
                    .await?;
            }
            Effect::Ignore => {
                tracing::warn!(
                    message = %event.message,
                    state = ?from,
                    action = ?event.action,
                    "Interaction not valid in current state"
                );
                return Ok(Some(from));
            }
        }

        if from != next && !self.store.commit(&event.message, from, next) {
            tracing::warn!(
                message = %event.message,
                state = ?from,
                "Confirmation changed while rendering, transition dropped"
            );
            return Ok(self.store.get(&event.message));
        }

        tracing::info!(message = %event.message, state = ?next, "Confirmation updated");
        Ok(Some(next))
    }
}
