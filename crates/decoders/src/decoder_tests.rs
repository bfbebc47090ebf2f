//! Tests for all queue decoders and DecoderRegistry selection.
//!
//! Payloads are built as the producers publish them (camelCase JSON) and run
//! through the same two stages the poller uses.

use serde_json::json;

use relay_common::error::AppError;
use relay_common::types::{ConfirmRequest, EmailIntent, QueueKind, RoutedIntent, SkipReason};

use crate::team_chat::TeamChatType;
use crate::{DecoderRegistry, parse_payload};

// ───────────────────────────── helpers ──────────────────────────────

fn decode(kind: QueueKind, raw: &str) -> Result<RoutedIntent, SkipReason> {
    let payload = parse_payload(raw.as_bytes()).expect("valid JSON");
    DecoderRegistry::new().decode(kind, &payload)
}

// ═══════════════════════════════════════════════════════════════════
//  Parsing
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_malformed_bytes_are_decode_errors() {
    let result = parse_payload(b"{chatId: 123");
    assert!(matches!(result, Err(AppError::Decode(_))));

    let result = parse_payload(&[0xff, 0xfe, 0x00]);
    assert!(matches!(result, Err(AppError::Decode(_))));
}

#[test]
fn test_non_object_is_invalid_for_every_kind() {
    for kind in [QueueKind::InstantMessage, QueueKind::Email, QueueKind::TeamChat] {
        assert_eq!(decode(kind, "[1, 2, 3]"), Err(SkipReason::NotAnObject));
        assert_eq!(decode(kind, "\"hello\""), Err(SkipReason::NotAnObject));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Instant message
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_instant_message_valid() {
    let intent = decode(
        QueueKind::InstantMessage,
        r#"{"chatId":"123","text":"hello"}"#,
    );
    assert_eq!(
        intent,
        Ok(RoutedIntent::InstantMessage {
            chat_id: "123".into(),
            text: "hello".into(),
        })
    );
}

#[test]
fn test_instant_message_numeric_chat_id() {
    let intent = decode(
        QueueKind::InstantMessage,
        r#"{"chatId":-1002197881869,"text":"hi"}"#,
    )
    .unwrap();
    assert!(matches!(intent, RoutedIntent::InstantMessage { chat_id, .. } if chat_id == "-1002197881869"));
}

#[test]
fn test_instant_message_missing_or_empty_fields() {
    assert_eq!(
        decode(QueueKind::InstantMessage, r#"{"text":"hello"}"#),
        Err(SkipReason::MissingField("chatId"))
    );
    assert_eq!(
        decode(QueueKind::InstantMessage, r#"{"chatId":"123","text":""}"#),
        Err(SkipReason::MissingField("text"))
    );
}

// ═══════════════════════════════════════════════════════════════════
//  Email
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_email_full_payload() {
    let intent = decode(
        QueueKind::Email,
        &json!({
            "email": "ops@example.com",
            "subject": "Shift",
            "message": "See you at 9",
            "html": "<b>See you at 9</b>",
            "sender": "hr@example.com"
        })
        .to_string(),
    );
    assert_eq!(
        intent,
        Ok(RoutedIntent::Email(EmailIntent {
            to: "ops@example.com".into(),
            subject: "Shift".into(),
            text: "See you at 9".into(),
            html: Some("<b>See you at 9</b>".into()),
            sender: Some("hr@example.com".into()),
        }))
    );
}

#[test]
fn test_email_optional_fields_default() {
    let intent = decode(
        QueueKind::Email,
        r#"{"email":"ops@example.com","message":"body"}"#,
    )
    .unwrap();
    match intent {
        RoutedIntent::Email(mail) => {
            assert_eq!(mail.subject, "");
            assert_eq!(mail.html, None);
            assert_eq!(mail.sender, None);
        }
        other => panic!("unexpected intent {:?}", other),
    }
}

#[test]
fn test_email_requires_address_and_message() {
    assert_eq!(
        decode(QueueKind::Email, r#"{"message":"body"}"#),
        Err(SkipReason::MissingField("email"))
    );
    assert_eq!(
        decode(QueueKind::Email, r#"{"email":"ops@example.com","subject":"x"}"#),
        Err(SkipReason::MissingField("message"))
    );
}

// ═══════════════════════════════════════════════════════════════════
//  Team chat
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_team_chat_type_parsing() {
    assert_eq!(TeamChatType::parse("direct"), Some(TeamChatType::Direct));
    assert_eq!(TeamChatType::parse("slack_group"), Some(TeamChatType::Group));
    assert_eq!(
        TeamChatType::parse("slack_group_confirm_subgroup"),
        Some(TeamChatType::GroupConfirmSubgroup)
    );
    assert_eq!(TeamChatType::parse("broadcast"), None);
}

#[test]
fn test_team_chat_direct() {
    let intent = decode(
        QueueKind::TeamChat,
        r#"{"type":"direct","body":{"userName":"olena","text":"ping"}}"#,
    );
    assert_eq!(
        intent,
        Ok(RoutedIntent::TeamChatDirect {
            user_name: "olena".into(),
            user_id: None,
            text: "ping".into(),
        })
    );
}

#[test]
fn test_team_chat_direct_keeps_known_user_id() {
    let intent = decode(
        QueueKind::TeamChat,
        r#"{"type":"slack_direct","body":{"userName":"olena","userId":"U42","text":"ping"}}"#,
    )
    .unwrap();
    assert!(matches!(intent, RoutedIntent::TeamChatDirect { user_id: Some(id), .. } if id == "U42"));
}

#[test]
fn test_team_chat_group_without_text_is_skipped() {
    assert_eq!(
        decode(
            QueueKind::TeamChat,
            r#"{"type":"group","body":{"channelId":"C1"}}"#
        ),
        Err(SkipReason::MissingField("text"))
    );
}

#[test]
fn test_team_chat_confirm() {
    let intent = decode(
        QueueKind::TeamChat,
        r#"{"type":"group_confirm_subgroup","body":{"userId":"U1","text":"Shift tomorrow?","channelId":"C9","subgroupId":"S3"}}"#,
    );
    assert_eq!(
        intent,
        Ok(RoutedIntent::TeamChatConfirm(ConfirmRequest {
            user_id: "U1".into(),
            text: "Shift tomorrow?".into(),
            channel_id: Some("C9".into()),
            subgroup_id: Some("S3".into()),
        }))
    );
}

#[test]
fn test_team_chat_unknown_type_and_missing_body() {
    assert_eq!(
        decode(QueueKind::TeamChat, r#"{"type":"voice","body":{}}"#),
        Err(SkipReason::UnsupportedType("voice".into()))
    );
    assert_eq!(
        decode(QueueKind::TeamChat, r#"{"type":"group"}"#),
        Err(SkipReason::MissingField("body"))
    );
    assert_eq!(
        decode(QueueKind::TeamChat, r#"{"body":{"text":"x"}}"#),
        Err(SkipReason::MissingField("type"))
    );
}

#[test]
fn test_same_payload_same_decision() {
    let raw = r#"{"type":"group","body":{"channelId":"C1","text":"hi"}}"#;
    assert_eq!(decode(QueueKind::TeamChat, raw), decode(QueueKind::TeamChat, raw));
}
