//! Integration tests for the confirmation flow driven through the router.
//!
//! A recording team-chat fake stands in for Slack so every rendering call
//! can be asserted.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use relay_common::error::AppError;
use relay_common::types::{ConfirmRequest, MessageRef, QueueKind};
use relay_engine::confirmation::{
    ConfirmationAction, ConfirmationFlow, ConfirmationState, InteractionEvent,
    REASON_REQUIRED_TEXT,
};
use relay_engine::router::MessageRouter;
use relay_notifier::TeamChat;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Prompt(String),
    Update { text: String, blocks: usize },
    Ephemeral { user_id: String, text: String },
}

#[derive(Default)]
struct RecordingSlack {
    calls: Mutex<Vec<Call>>,
    fail_updates: bool,
}

impl RecordingSlack {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TeamChat for RecordingSlack {
    async fn send_direct(&self, _: &str, _: Option<&str>, _: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn send_group(&self, _: &str, _: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn send_confirmation(&self, request: &ConfirmRequest) -> Result<MessageRef, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Prompt(request.text.clone()));
        Ok(MessageRef {
            channel_id: format!("D-{}", request.user_id),
            ts: "1718000000.000100".to_string(),
        })
    }

    async fn update_message(
        &self,
        _message: &MessageRef,
        text: &str,
        blocks: &[Value],
    ) -> Result<(), AppError> {
        if self.fail_updates {
            return Err(AppError::channel("slack", "message_not_found"));
        }
        self.calls.lock().unwrap().push(Call::Update {
            text: text.to_string(),
            blocks: blocks.len(),
        });
        Ok(())
    }

    async fn post_ephemeral(
        &self,
        _channel_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(Call::Ephemeral {
            user_id: user_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

fn prompt_ref() -> MessageRef {
    MessageRef {
        channel_id: "D-U1".to_string(),
        ts: "1718000000.000100".to_string(),
    }
}

fn event(action: ConfirmationAction) -> InteractionEvent {
    InteractionEvent {
        message: prompt_ref(),
        actor_id: "U1".to_string(),
        action,
    }
}

async fn router_with_prompt() -> (MessageRouter, Arc<RecordingSlack>) {
    let slack = Arc::new(RecordingSlack::default());
    let router = MessageRouter::new().with_team_chat(slack.clone());
    let outcome = router
        .route(
            QueueKind::TeamChat,
            &json!({
                "type": "group_confirm_subgroup",
                "body": { "userId": "U1", "text": "Shift tomorrow?", "subgroupId": "S1" }
            }),
        )
        .await;
    assert!(outcome.is_delivered());
    (router, slack)
}

#[tokio::test]
async fn test_cancel_then_empty_then_reason() {
    let (router, slack) = router_with_prompt().await;
    let flow = router.confirmations().unwrap();

    let state = flow.handle(&event(ConfirmationAction::Cancel)).await.unwrap();
    assert_eq!(state, Some(ConfirmationState::AwaitingReason));

    let state = flow
        .handle(&event(ConfirmationAction::SubmitReason {
            reason: Some(String::new()),
        }))
        .await
        .unwrap();
    assert_eq!(state, Some(ConfirmationState::AwaitingReason));

    let state = flow
        .handle(&event(ConfirmationAction::SubmitReason {
            reason: Some("Sick leave".to_string()),
        }))
        .await
        .unwrap();
    assert_eq!(state, Some(ConfirmationState::Cancelled));
    assert!(flow.store().is_empty());

    let calls = slack.calls();
    assert_eq!(calls[0], Call::Prompt("Shift tomorrow?".to_string()));
    assert!(matches!(&calls[1], Call::Update { blocks, .. } if *blocks == 3));
    assert_eq!(
        calls[2],
        Call::Ephemeral {
            user_id: "U1".to_string(),
            text: REASON_REQUIRED_TEXT.to_string()
        }
    );
    assert_eq!(
        calls[3],
        Call::Update {
            text: "Користувач <@U1> відмінив за причиною: \"Sick leave\"".to_string(),
            blocks: 0
        }
    );
}

#[tokio::test]
async fn test_confirm_then_late_clicks_are_ignored() {
    let (router, slack) = router_with_prompt().await;
    let flow = router.confirmations().unwrap();

    let state = flow.handle(&event(ConfirmationAction::Confirm)).await.unwrap();
    assert_eq!(state, Some(ConfirmationState::Confirmed));

    // A second click on the same, now settled, prompt.
    let state = flow.handle(&event(ConfirmationAction::Cancel)).await.unwrap();
    assert_eq!(state, None);

    let calls = slack.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1],
        Call::Update {
            text: "Підтверджено!".to_string(),
            blocks: 0
        }
    );
}

#[tokio::test]
async fn test_two_prompts_for_same_user_are_independent() {
    let slack = Arc::new(RecordingSlack::default());
    let router = MessageRouter::new().with_team_chat(slack.clone());
    let flow = router.confirmations().unwrap();

    let first = flow
        .open(&ConfirmRequest {
            user_id: "U1".to_string(),
            text: "Monday?".to_string(),
            channel_id: None,
            subgroup_id: None,
        })
        .await
        .unwrap();
    let second = MessageRef {
        channel_id: first.channel_id.clone(),
        ts: "1718000099.000200".to_string(),
    };
    flow.store().insert(second.clone(), ConfirmationState::Pending);

    flow.handle(&InteractionEvent {
        message: first.clone(),
        actor_id: "U1".to_string(),
        action: ConfirmationAction::Cancel,
    })
    .await
    .unwrap();

    assert_eq!(flow.store().get(&first), Some(ConfirmationState::AwaitingReason));
    assert_eq!(flow.store().get(&second), Some(ConfirmationState::Pending));
}

#[tokio::test]
async fn test_failed_rendering_keeps_state() {
    let slack = Arc::new(RecordingSlack {
        fail_updates: true,
        ..Default::default()
    });
    let flow = ConfirmationFlow::new(slack.clone());
    flow.store().insert(prompt_ref(), ConfirmationState::Pending);

    for action in [ConfirmationAction::Cancel, ConfirmationAction::Confirm] {
        let result = flow.handle(&event(action)).await;
        assert!(matches!(result, Err(AppError::Channel { .. })));
        assert_eq!(flow.store().get(&prompt_ref()), Some(ConfirmationState::Pending));
    }
    assert!(slack.calls().is_empty());
}
