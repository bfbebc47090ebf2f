use serde_json::{Map, Value};

use relay_common::types::RoutedIntent;

use crate::fields::required;
use crate::{Decoded, PayloadDecoder};

/// Decoder for instant-message queue payloads: `{chatId, text}`.
pub struct TelegramDecoder;

impl TelegramDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TelegramDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadDecoder for TelegramDecoder {
    fn decode(&self, payload: &Map<String, Value>) -> Decoded {
        Ok(RoutedIntent::InstantMessage {
            chat_id: required(payload, "chatId")?,
            text: required(payload, "text")?,
        })
    }

    fn name(&self) -> &'static str {
        "Telegram"
    }
}
