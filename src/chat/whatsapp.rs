//! Default [`ChatEngine`] backed by the WhatsApp Cloud API.
//!
//! Every admitted message gets the configured greeting as a reply.

use super::{ChatEngine, CheckoutInfo, ConversationContext};
use crate::webhook::whatsapp::client::WhatsAppClient;
use anyhow::Context;
use async_trait::async_trait;

pub struct WhatsAppChatClient {
    pub client: WhatsAppClient,
    pub greeting: String,
}

#[async_trait]
impl ChatEngine for WhatsAppChatClient {
    fn new_conversation_context(
        &self,
        sender_number: &str,
        message_body: &str,
        is_auto_inc: bool,
    ) -> ConversationContext {
        ConversationContext {
            sender_number: sender_number.to_string(),
            message_body: message_body.to_string(),
            is_auto_inc,
        }
    }

    async fn chat_begin(
        &self,
        convo: ConversationContext,
        checkout: &CheckoutInfo,
        _is_auto_inc: bool,
    ) -> anyhow::Result<()> {
        logfire::debug!(
            "Starting chat with {sender} using {checkout}",
            sender = convo.sender_number.clone(),
            checkout = format!("{checkout:?}")
        );

        let response = self
            .client
            .send_text_message(convo.sender_number.clone(), self.greeting.clone())
            .await
            .with_context(|| format!("Failed to reply to {}", convo.sender_number))?;

        logfire::info!(
            "Replied to {sender}, {count} message(s) accepted",
            sender = convo.sender_number,
            count = response.messages.len() as i64
        );

        Ok(())
    }
}
