//! # Conversation Engine Boundary
//!
//! The webhook pipeline hands every admitted message to a [`ChatEngine`].
//! What the engine does with it (menus, orders, replies) is its own business;
//! the pipeline only builds a [`ConversationContext`] and starts the chat.

pub mod whatsapp;

use async_trait::async_trait;
use std::{fmt, sync::Arc};

/// Per-message conversation state handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationContext {
    /// WhatsApp ID (phone number) of the user writing to the bot
    pub sender_number: String,
    /// Lowercased text of the message
    pub message_body: String,
    /// Whether the engine tables use auto-incrementing ids
    pub is_auto_inc: bool,
}

/// Checkout links and merchant credentials the engine needs to build
/// payment requests.
#[derive(Clone, Default)]
pub struct CheckoutInfo {
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
    pub merchant_id: String,
    pub merchant_key: String,
    pub passphrase: String,
    pub host_url: String,
    pub item_name_prefix: String,
}

impl fmt::Debug for CheckoutInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutInfo")
            .field("return_url", &self.return_url)
            .field("cancel_url", &self.cancel_url)
            .field("notify_url", &self.notify_url)
            .field("merchant_id", &self.merchant_id)
            .field("merchant_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("host_url", &self.host_url)
            .field("item_name_prefix", &self.item_name_prefix)
            .finish()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatEngine: Send + Sync {
    fn new_conversation_context(
        &self,
        sender_number: &str,
        message_body: &str,
        is_auto_inc: bool,
    ) -> ConversationContext;

    /// Runs one conversation turn for the given context.
    async fn chat_begin(
        &self,
        convo: ConversationContext,
        checkout: &CheckoutInfo,
        is_auto_inc: bool,
    ) -> anyhow::Result<()>;
}

pub type ImplChatEngine = Arc<dyn ChatEngine>;
