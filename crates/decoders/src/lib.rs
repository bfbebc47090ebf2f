//! Queue payload decoding.
//!
//! A queue message is raw bytes. Decoding happens in two stages:
//! 1. `parse_payload` turns the bytes into JSON. Failure here is a decode error
//!    and the message must not be acknowledged.
//! 2. `DecoderRegistry::decode` selects the fields for the bound queue kind and
//!    yields a `RoutedIntent`, or a `SkipReason` when required fields are absent.

pub mod email;
mod fields;
pub mod team_chat;
pub mod telegram;

#[cfg(test)]
mod decoder_tests;

use serde_json::{Map, Value};

use relay_common::error::AppError;
use relay_common::types::{QueueKind, RoutedIntent, SkipReason};

/// Result of decoding one payload for one queue kind.
pub type Decoded = Result<RoutedIntent, SkipReason>;

/// Trait that all queue-specific decoders implement.
pub trait PayloadDecoder: Send + Sync {
    /// Select the fields for one channel operation from a JSON object.
    fn decode(&self, payload: &Map<String, Value>) -> Decoded;

    /// Human-readable name for this decoder.
    fn name(&self) -> &'static str;
}

/// Parse raw queue bytes as JSON.
pub fn parse_payload(bytes: &[u8]) -> Result<Value, AppError> {
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::Decode(format!("invalid JSON payload: {}", e)))
}

/// One decoder per queue kind, selected by an exhaustive match.
pub struct DecoderRegistry {
    telegram: telegram::TelegramDecoder,
    email: email::EmailDecoder,
    team_chat: team_chat::TeamChatDecoder,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self {
            telegram: telegram::TelegramDecoder::new(),
            email: email::EmailDecoder::new(),
            team_chat: team_chat::TeamChatDecoder::new(),
        }
    }

    pub fn decoder_for(&self, kind: QueueKind) -> &dyn PayloadDecoder {
        match kind {
            QueueKind::InstantMessage => &self.telegram,
            QueueKind::Email => &self.email,
            QueueKind::TeamChat => &self.team_chat,
        }
    }

    /// Decode a parsed payload for the given queue kind.
    ///
    /// Non-object JSON is structurally invalid for every kind.
    pub fn decode(&self, kind: QueueKind, payload: &Value) -> Decoded {
        let object = payload.as_object().ok_or(SkipReason::NotAnObject)?;
        let decoder = self.decoder_for(kind);
        let decoded = decoder.decode(object);

        match &decoded {
            Ok(intent) => tracing::debug!(
                decoder = decoder.name(),
                intent = intent.label(),
                "Decoded payload"
            ),
            Err(reason) => tracing::debug!(
                decoder = decoder.name(),
                reason = %reason,
                "Payload skipped"
            ),
        }

        decoded
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
