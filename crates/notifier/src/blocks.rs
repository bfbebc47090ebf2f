//! Block Kit rendering for the confirmation prompt.

use serde_json::{Value, json};

pub const ACTION_CONFIRM: &str = "confirm_action";
pub const ACTION_CANCEL: &str = "cancel_action";
pub const ACTION_SUBMIT_REASON: &str = "submit_reason";
pub const REASON_BLOCK_ID: &str = "cancel_reason_block";
pub const REASON_INPUT_ID: &str = "cancel_reason_input";

pub const CONFIRM_LABEL: &str = "Подтвердить";
pub const CANCEL_LABEL: &str = "Отменить";

/// Notification fallback text for the prompt.
pub const PROMPT_FALLBACK_TEXT: &str = "Будеш працювати?";

/// Bold prompt text followed by confirm and cancel buttons.
pub fn confirmation_prompt(text: &str, user_id: &str) -> Vec<Value> {
    vec![
        json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*{}*", text) }
        }),
        json!({
            "type": "actions",
            "elements": [
                button(CONFIRM_LABEL, &format!("confirm_{}", user_id), ACTION_CONFIRM),
                button(CANCEL_LABEL, &format!("cancel_{}", user_id), ACTION_CANCEL),
            ]
        }),
    ]
}

/// Free-text reason input with a submit button.
pub fn reason_form(user_id: &str) -> Vec<Value> {
    vec![
        json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": "Яка причина:" }
        }),
        json!({
            "type": "input",
            "block_id": REASON_BLOCK_ID,
            "element": {
                "type": "plain_text_input",
                "action_id": REASON_INPUT_ID,
                "multiline": true
            },
            "label": { "type": "plain_text", "text": "Причина" }
        }),
        json!({
            "type": "actions",
            "elements": [
                button("Зберегти", &format!("submit_reason_{}", user_id), ACTION_SUBMIT_REASON),
            ]
        }),
    ]
}

fn button(label: &str, value: &str, action_id: &str) -> Value {
    json!({
        "type": "button",
        "text": { "type": "plain_text", "text": label },
        "value": value,
        "action_id": action_id
    })
}
