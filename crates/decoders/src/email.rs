use serde_json::{Map, Value};

use relay_common::types::{EmailIntent, RoutedIntent};

use crate::fields::{optional, required};
use crate::{Decoded, PayloadDecoder};

/// Decoder for email queue payloads: `{email, subject?, message, html?, sender?}`.
pub struct EmailDecoder;

impl EmailDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmailDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadDecoder for EmailDecoder {
    fn decode(&self, payload: &Map<String, Value>) -> Decoded {
        Ok(RoutedIntent::Email(EmailIntent {
            to: required(payload, "email")?,
            text: required(payload, "message")?,
            subject: optional(payload, "subject").unwrap_or_default(),
            html: optional(payload, "html"),
            sender: optional(payload, "sender"),
        }))
    }

    fn name(&self) -> &'static str {
        "Email"
    }
}
