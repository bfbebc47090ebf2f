use serde_json::{Map, Value};

use relay_common::types::{ConfirmRequest, RoutedIntent, SkipReason};

use crate::fields::{optional, required};
use crate::{Decoded, PayloadDecoder};

/// Team-chat operations selected by the payload's `type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamChatType {
    Direct,
    Group,
    GroupConfirmSubgroup,
}

impl TeamChatType {
    /// Parse a discriminator. Producers also emit `slack_`-prefixed names.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.strip_prefix("slack_").unwrap_or(raw) {
            "direct" => Some(TeamChatType::Direct),
            "group" => Some(TeamChatType::Group),
            "group_confirm_subgroup" => Some(TeamChatType::GroupConfirmSubgroup),
            _ => None,
        }
    }
}

/// Decoder for team-chat queue payloads: `{type, body: {...}}`.
pub struct TeamChatDecoder;

impl TeamChatDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TeamChatDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadDecoder for TeamChatDecoder {
    fn decode(&self, payload: &Map<String, Value>) -> Decoded {
        let raw_type = required(payload, "type")?;
        let kind = TeamChatType::parse(&raw_type).ok_or(SkipReason::UnsupportedType(raw_type))?;

        let body = payload
            .get("body")
            .and_then(Value::as_object)
            .ok_or(SkipReason::MissingField("body"))?;

        match kind {
            TeamChatType::Direct => Ok(RoutedIntent::TeamChatDirect {
                user_name: required(body, "userName")?,
                text: required(body, "text")?,
                user_id: optional(body, "userId"),
            }),
            TeamChatType::Group => Ok(RoutedIntent::TeamChatGroup {
                channel_id: required(body, "channelId")?,
                text: required(body, "text")?,
            }),
            TeamChatType::GroupConfirmSubgroup => {
                Ok(RoutedIntent::TeamChatConfirm(ConfirmRequest {
                    user_id: required(body, "userId")?,
                    text: required(body, "text")?,
                    channel_id: optional(body, "channelId"),
                    subgroup_id: optional(body, "subgroupId"),
                }))
            }
        }
    }

    fn name(&self) -> &'static str {
        "TeamChat"
    }
}
