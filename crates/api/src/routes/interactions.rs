//! Slack interaction webhook.
//!
//! Slack posts button clicks as a form body with a single `payload` field
//! holding JSON. The request is verified and acknowledged right away; the
//! confirmation transition runs in a spawned task so Slack never waits on
//! the outbound `chat.update`.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde_json::Value;

use relay_common::error::AppError;
use relay_common::types::MessageRef;
use relay_engine::confirmation::{ConfirmationAction, InteractionEvent};
use relay_notifier::blocks::{
    ACTION_CANCEL, ACTION_CONFIRM, ACTION_SUBMIT_REASON, REASON_BLOCK_ID, REASON_INPUT_ID,
};

use crate::middleware::signature::verify_request;
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slack/interactions", post(handle_interaction))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

async fn handle_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let secret = state
        .config
        .slack_signing_secret
        .as_deref()
        .ok_or_else(|| AppError::Config("SLACK_SIGNING_SECRET is not set".to_string()))?;
    verify_request(secret, &headers, &body, chrono::Utc::now().timestamp())?;

    let Some(event) = parse_interaction(&body)? else {
        return Ok(StatusCode::OK);
    };

    match state.confirmations.clone() {
        Some(flow) => {
            tokio::spawn(async move {
                if let Err(e) = flow.handle(&event).await {
                    tracing::error!(message = %event.message, error = %e, "Failed to apply interaction");
                }
            });
        }
        None => tracing::warn!("Interaction received but no confirmation flow is configured"),
    }

    Ok(StatusCode::OK)
}

/// Parse a form-encoded interaction body.
///
/// Returns `Ok(None)` for well-formed interactions that are not confirmation
/// actions, such as typing into the reason input.
pub fn parse_interaction(body: &[u8]) -> Result<Option<InteractionEvent>, AppError> {
    let payload = url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "payload")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| AppError::Decode("interaction body has no payload field".to_string()))?;

    let payload: Value = serde_json::from_str(&payload)
        .map_err(|e| AppError::Decode(format!("interaction payload is not JSON: {}", e)))?;

    let Some(action_id) = payload.pointer("/actions/0/action_id").and_then(Value::as_str) else {
        return Ok(None);
    };

    let action = match action_id {
        ACTION_CONFIRM => ConfirmationAction::Confirm,
        ACTION_CANCEL => ConfirmationAction::Cancel,
        ACTION_SUBMIT_REASON => ConfirmationAction::SubmitReason {
            reason: payload
                .pointer(&format!(
                    "/state/values/{}/{}/value",
                    REASON_BLOCK_ID, REASON_INPUT_ID
                ))
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        other => {
            tracing::debug!(action_id = other, "Ignoring unrelated interaction");
            return Ok(None);
        }
    };

    let text_at = |pointers: &[&str]| {
        pointers
            .iter()
            .find_map(|p| payload.pointer(p).and_then(Value::as_str))
            .map(str::to_string)
    };

    let actor_id = text_at(&["/user/id"])
        .ok_or_else(|| AppError::Decode("interaction has no user id".to_string()))?;
    let channel_id = text_at(&["/channel/id", "/container/channel_id"])
        .ok_or_else(|| AppError::Decode("interaction has no channel id".to_string()))?;
    let ts = text_at(&["/message/ts", "/container/message_ts"])
        .ok_or_else(|| AppError::Decode("interaction has no message ts".to_string()))?;

    Ok(Some(InteractionEvent {
        message: MessageRef { channel_id, ts },
        actor_id,
        action,
    }))
}
