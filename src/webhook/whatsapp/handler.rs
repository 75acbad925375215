//! # WhatsApp Webhook Handler
//!
//! Admission pipeline for an authenticated delivery:
//! classify → extract the last message → check its timestamp → dispatch.
//!
//! Everything here runs after the HTTP acknowledgment was sent, so failures
//! are reported as [`DeliveryError`] and only logged by the caller.

use super::schemas::{DeliveryProbe, WebhookPayload};
use crate::{
    chat::{ChatEngine, CheckoutInfo},
    consts,
    webhook::WebhookSettings,
};
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[display("malformed payload: {_0}")]
    MalformedPayload(#[error(not(source))] String),
    #[display("no message in payload")]
    NoMessageInPayload,
    #[display("failed to get last message timestamp")]
    MissingTimestamp,
    #[display("unparseable message timestamp: {_0}")]
    UnparseableTimestamp(#[error(not(source))] String),
    #[display("message was stale")]
    StaleMessage,
    #[display("chat engine failed: {_0}")]
    ChatEngine(#[error(not(source))] String),
}

/// What kind of event a delivery carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// Delivery / read / failed receipts for messages the bot sent
    StatusUpdate,
    /// Inbound user messages (or anything that is not clearly a status update)
    Message,
}

/// Terminal outcome of a delivery that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    StatusUpdate,
    SelfEcho,
    Forwarded,
}

/// Most recent message of a delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMessage {
    pub sender: String,
    /// Lowercased text body
    pub body: String,
    pub timestamp: String,
}

/// Message that passed the timestamp checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMessage {
    pub body: String,
    pub sender: String,
}

/// Classifies a raw delivery without committing to the message shape.
///
/// A delivery is a status update when it carries status receipts and no
/// messages. Bodies the probe can not read are classified as messages so the
/// extractor reports them as malformed.
pub fn classify_delivery(body: &[u8]) -> DeliveryKind {
    match serde_json::from_slice::<DeliveryProbe>(body) {
        Ok(probe) if probe.status_count() > 0 && probe.message_count() == 0 => {
            DeliveryKind::StatusUpdate
        }
        _ => DeliveryKind::Message,
    }
}

/// Last element of a sequence, an empty one means the delivery has no message
fn last_of<T>(items: &[T]) -> Result<&T, DeliveryError> {
    items.last().ok_or(DeliveryError::NoMessageInPayload)
}

/// Parses the message shape and takes the last message of the last change of
/// the last entry. Deliveries are ordered oldest first.
pub fn extract_last_message(body: &[u8]) -> Result<ExtractedMessage, DeliveryError> {
    let payload: WebhookPayload = serde_json::from_slice(body)
        .map_err(|e| DeliveryError::MalformedPayload(e.to_string()))?;

    let last_entry = last_of(&payload.entry)?;
    let last_change = last_of(&last_entry.changes)?;
    let last_message = last_of(&last_change.value.messages)?;

    logfire::debug!(
        "Last message {id} of type {msg_type} from entry {entry}",
        id = last_message.id.clone(),
        msg_type = last_message.msg_type.clone(),
        entry = last_entry.id.clone()
    );

    Ok(ExtractedMessage {
        sender: last_message.from.clone(),
        body: last_message
            .text
            .as_ref()
            .map(|text| text.body.to_lowercase())
            .unwrap_or_default(),
        timestamp: last_message.timestamp.clone(),
    })
}

/// Whether a message sent at `timestamp` (seconds since epoch) is at least
/// `stale_msg_timeout_mins` old at `now`.
pub fn is_message_stale(timestamp: i64, stale_msg_timeout_mins: i64, now: DateTime<Utc>) -> bool {
    let age_secs = now.timestamp().saturating_sub(timestamp);
    age_secs >= stale_msg_timeout_mins.saturating_mul(60)
}

/// Rejects messages with a missing, unparseable or stale timestamp
pub fn check_message_validity(
    message: ExtractedMessage,
    stale_msg_timeout_mins: i64,
    now: DateTime<Utc>,
) -> Result<ValidMessage, DeliveryError> {
    let timestamp = message.timestamp.as_str();
    if timestamp.is_empty() || timestamp == consts::MISSING_TIMESTAMP_SENTINEL {
        return Err(DeliveryError::MissingTimestamp);
    }

    let sent_at: i64 = timestamp
        .parse()
        .map_err(|_| DeliveryError::UnparseableTimestamp(timestamp.to_string()))?;

    if is_message_stale(sent_at, stale_msg_timeout_mins, now) {
        return Err(DeliveryError::StaleMessage);
    }

    Ok(ValidMessage {
        body: message.body,
        sender: message.sender,
    })
}

/// Forwards a valid message to the chat engine unless the bot sent it itself
pub async fn dispatch_message(
    message: ValidMessage,
    settings: &WebhookSettings,
    checkout: &CheckoutInfo,
    engine: &dyn ChatEngine,
) -> Result<Admission, DeliveryError> {
    if message.sender == settings.host_number {
        logfire::info!("You sent a message: {body}", body = message.body);
        return Ok(Admission::SelfEcho);
    }

    let convo =
        engine.new_conversation_context(&message.sender, &message.body, settings.is_auto_inc);
    engine
        .chat_begin(convo, checkout, settings.is_auto_inc)
        .await
        .map_err(|e| DeliveryError::ChatEngine(format!("{e:#}")))?;

    Ok(Admission::Forwarded)
}

/// Runs the whole admission pipeline for an authenticated delivery body
#[tracing::instrument(skip_all, fields(body_len = body.len()))]
pub async fn process_delivery(
    body: &[u8],
    settings: &WebhookSettings,
    checkout: &CheckoutInfo,
    engine: &dyn ChatEngine,
    now: DateTime<Utc>,
) -> Result<Admission, DeliveryError> {
    if classify_delivery(body) == DeliveryKind::StatusUpdate {
        logfire::info!("Status updates unhandled at this time.");
        return Ok(Admission::StatusUpdate);
    }

    let message = extract_last_message(body)?;
    let message = check_message_validity(message, settings.stale_msg_timeout_mins, now)?;

    dispatch_message(message, settings, checkout, engine).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ConversationContext, MockChatEngine};
    use chrono::TimeDelta;
    use mockall::predicate::*;
    use serde_json::json;

    const HOST_NUMBER: &str = "27820000000";

    fn settings() -> WebhookSettings {
        WebhookSettings {
            verify_token: "verify-me".into(),
            app_secret: "app-secret".into(),
            host_number: HOST_NUMBER.into(),
            stale_msg_timeout_mins: 10,
            is_auto_inc: false,
        }
    }

    fn text_message(from: &str, body: &str, timestamp: &str) -> serde_json::Value {
        json!({
            "from": from,
            "id": format!("wamid.{from}.{timestamp}"),
            "timestamp": timestamp,
            "type": "text",
            "text": {"body": body}
        })
    }

    fn message_payload(entries: Vec<Vec<Vec<serde_json::Value>>>) -> Vec<u8> {
        let entry: Vec<_> = entries
            .into_iter()
            .map(|changes| {
                let changes: Vec<_> = changes
                    .into_iter()
                    .map(|messages| {
                        json!({
                            "field": "messages",
                            "value": {
                                "messaging_product": "whatsapp",
                                "metadata": {
                                    "display_phone_number": HOST_NUMBER,
                                    "phone_number_id": "106540352242922"
                                },
                                "contacts": [{"profile": {"name": "Thandi"}, "wa_id": "27821234567"}],
                                "messages": messages
                            }
                        })
                    })
                    .collect();
                json!({"id": "102290129340398", "changes": changes})
            })
            .collect();

        serde_json::to_vec(&json!({"object": "whatsapp_business_account", "entry": entry}))
            .unwrap()
    }

    fn status_payload() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "102290129340398",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "statuses": [{
                            "id": "wamid.abc",
                            "status": "read",
                            "timestamp": "1750263773",
                            "recipient_id": "27821234567"
                        }]
                    }
                }]
            }]
        }))
        .unwrap()
    }

    fn extracted(timestamp: &str) -> ExtractedMessage {
        ExtractedMessage {
            sender: "27821234567".into(),
            body: "hi".into(),
            timestamp: timestamp.into(),
        }
    }

    fn valid(sender: &str, body: &str) -> ValidMessage {
        ValidMessage {
            sender: sender.into(),
            body: body.into(),
        }
    }

    #[test]
    fn test_classify_status_update() {
        assert_eq!(
            classify_delivery(&status_payload()),
            DeliveryKind::StatusUpdate
        );
    }

    #[test]
    fn test_classify_status_update_regardless_of_key_order_and_whitespace() {
        let body = br#"{ "entry" : [ { "changes" : [ { "value" : {
            "statuses" : [ { "status" : "failed", "id" : "wamid.x" } ] } } ] } ] }"#;

        assert_eq!(classify_delivery(body), DeliveryKind::StatusUpdate);
    }

    #[test]
    fn test_classify_message() {
        let body = message_payload(vec![vec![vec![text_message("1", "Hi", "1")]]]);
        assert_eq!(classify_delivery(&body), DeliveryKind::Message);
    }

    #[test]
    fn test_classify_garbage_as_message() {
        assert_eq!(classify_delivery(b"not json"), DeliveryKind::Message);
        assert_eq!(classify_delivery(b"{\"entry\": 5}"), DeliveryKind::Message);
    }

    #[test]
    fn test_extract_last_message_of_batch() {
        let body = message_payload(vec![
            vec![vec![text_message("111", "first", "100")]],
            vec![
                vec![text_message("222", "second", "200")],
                vec![
                    text_message("333", "third", "300"),
                    text_message("27821234567", "Hello THERE", "400"),
                ],
            ],
        ]);

        assert_eq!(
            extract_last_message(&body),
            Ok(ExtractedMessage {
                sender: "27821234567".into(),
                body: "hello there".into(),
                timestamp: "400".into(),
            })
        );
    }

    #[test]
    fn test_extract_non_text_message_has_empty_body() {
        let body = message_payload(vec![vec![vec![json!({
            "from": "27821234567",
            "id": "wamid.img",
            "timestamp": "400",
            "type": "image",
            "image": {"id": "1234", "mime_type": "image/jpeg"}
        })]]]);

        let message = extract_last_message(&body).unwrap();
        assert_eq!(message.body, "");
        assert_eq!(message.timestamp, "400");
    }

    #[test]
    fn test_extract_empty_messages() {
        let body = message_payload(vec![vec![vec![]]]);
        assert_eq!(
            extract_last_message(&body),
            Err(DeliveryError::NoMessageInPayload)
        );
    }

    #[test]
    fn test_extract_empty_entries_and_changes() {
        assert_eq!(
            extract_last_message(br#"{"object": "whatsapp_business_account", "entry": []}"#),
            Err(DeliveryError::NoMessageInPayload)
        );
        assert_eq!(
            extract_last_message(br#"{"entry": [{"id": "1", "changes": []}]}"#),
            Err(DeliveryError::NoMessageInPayload)
        );
    }

    #[test]
    fn test_extract_malformed() {
        assert!(matches!(
            extract_last_message(b"{\"entry\": [{\"changes\": \"nope\"}]}"),
            Err(DeliveryError::MalformedPayload(_))
        ));
        assert!(matches!(
            extract_last_message(b"not json"),
            Err(DeliveryError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_missing_timestamp() {
        let now = Utc::now();
        for timestamp in ["", "-1"] {
            for threshold in [1, 10, 1_000_000] {
                assert_eq!(
                    check_message_validity(extracted(timestamp), threshold, now),
                    Err(DeliveryError::MissingTimestamp)
                );
            }
        }
    }

    #[test]
    fn test_unparseable_timestamp() {
        assert_eq!(
            check_message_validity(extracted("yesterday"), 10, Utc::now()),
            Err(DeliveryError::UnparseableTimestamp("yesterday".into()))
        );
        assert!(matches!(
            check_message_validity(extracted("1.5e9"), 10, Utc::now()),
            Err(DeliveryError::UnparseableTimestamp(_))
        ));
    }

    #[test]
    fn test_staleness_boundary_is_inclusive() {
        let now = Utc::now();
        let ten_minutes_ago = (now - TimeDelta::minutes(10)).timestamp();
        let almost_ten_minutes_ago = (now - TimeDelta::minutes(10) + TimeDelta::seconds(1)).timestamp();

        assert!(is_message_stale(ten_minutes_ago, 10, now));
        assert!(!is_message_stale(almost_ten_minutes_ago, 10, now));

        assert_eq!(
            check_message_validity(extracted(&ten_minutes_ago.to_string()), 10, now),
            Err(DeliveryError::StaleMessage)
        );
        assert_eq!(
            check_message_validity(extracted(&almost_ten_minutes_ago.to_string()), 10, now),
            Ok(valid("27821234567", "hi"))
        );
    }

    #[test]
    fn test_stale_extreme_timestamps() {
        let now = Utc::now();
        assert!(is_message_stale(i64::MIN, 10, now));
        assert!(!is_message_stale(i64::MAX, 10, now));
    }

    #[ntex::test]
    async fn test_dispatch_self_echo_is_never_forwarded() {
        let mut engine = MockChatEngine::new();
        engine.expect_new_conversation_context().times(0);
        engine.expect_chat_begin().times(0);

        for body in ["hi", "", "menu", "order 2"] {
            let admission = dispatch_message(
                valid(HOST_NUMBER, body),
                &settings(),
                &CheckoutInfo::default(),
                &engine,
            )
            .await;

            assert_eq!(admission, Ok(Admission::SelfEcho));
        }
    }

    #[ntex::test]
    async fn test_dispatch_forwards_to_engine() {
        let mut engine = MockChatEngine::new();
        engine
            .expect_new_conversation_context()
            .with(eq("27821234567"), eq("hi"), eq(false))
            .times(1)
            .returning(|sender, body, is_auto_inc| ConversationContext {
                sender_number: sender.to_string(),
                message_body: body.to_string(),
                is_auto_inc,
            });
        engine
            .expect_chat_begin()
            .withf(|convo, _, is_auto_inc| convo.sender_number == "27821234567" && !*is_auto_inc)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let admission = dispatch_message(
            valid("27821234567", "hi"),
            &settings(),
            &CheckoutInfo::default(),
            &engine,
        )
        .await;

        assert_eq!(admission, Ok(Admission::Forwarded));
    }

    #[ntex::test]
    async fn test_dispatch_reports_engine_failure() {
        let mut engine = MockChatEngine::new();
        engine
            .expect_new_conversation_context()
            .returning(|sender, body, is_auto_inc| ConversationContext {
                sender_number: sender.to_string(),
                message_body: body.to_string(),
                is_auto_inc,
            });
        engine
            .expect_chat_begin()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("db is down")));

        let admission = dispatch_message(
            valid("27821234567", "hi"),
            &settings(),
            &CheckoutInfo::default(),
            &engine,
        )
        .await;

        assert_eq!(admission, Err(DeliveryError::ChatEngine("db is down".into())));
    }

    #[ntex::test]
    async fn test_process_status_update_never_reaches_engine() {
        let mut engine = MockChatEngine::new();
        engine.expect_new_conversation_context().times(0);
        engine.expect_chat_begin().times(0);

        let admission = process_delivery(
            &status_payload(),
            &settings(),
            &CheckoutInfo::default(),
            &engine,
            Utc::now(),
        )
        .await;

        assert_eq!(admission, Ok(Admission::StatusUpdate));
    }

    #[ntex::test]
    async fn test_process_empty_messages_never_reaches_engine() {
        let mut engine = MockChatEngine::new();
        engine.expect_new_conversation_context().times(0);
        engine.expect_chat_begin().times(0);

        let admission = process_delivery(
            &message_payload(vec![vec![vec![]]]),
            &settings(),
            &CheckoutInfo::default(),
            &engine,
            Utc::now(),
        )
        .await;

        assert_eq!(admission, Err(DeliveryError::NoMessageInPayload));
    }

    #[ntex::test]
    async fn test_process_stale_message_never_reaches_engine() {
        let mut engine = MockChatEngine::new();
        engine.expect_chat_begin().times(0);

        let now = Utc::now();
        let an_hour_ago = (now - TimeDelta::hours(1)).timestamp().to_string();
        let body = message_payload(vec![vec![vec![text_message("27821234567", "Hi", &an_hour_ago)]]]);

        let admission =
            process_delivery(&body, &settings(), &CheckoutInfo::default(), &engine, now).await;

        assert_eq!(admission, Err(DeliveryError::StaleMessage));
    }

    #[ntex::test]
    async fn test_process_fresh_message_is_forwarded_lowercased() {
        let mut engine = MockChatEngine::new();
        engine
            .expect_new_conversation_context()
            .with(eq("27821234567"), eq("hi"), eq(false))
            .times(1)
            .returning(|sender, body, is_auto_inc| ConversationContext {
                sender_number: sender.to_string(),
                message_body: body.to_string(),
                is_auto_inc,
            });
        engine
            .expect_chat_begin()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let now = Utc::now();
        let body = message_payload(vec![vec![vec![text_message(
            "27821234567",
            "Hi",
            &now.timestamp().to_string(),
        )]]]);

        let admission =
            process_delivery(&body, &settings(), &CheckoutInfo::default(), &engine, now).await;

        assert_eq!(admission, Ok(Admission::Forwarded));
    }
}
